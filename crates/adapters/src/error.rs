use cambist_stream::StreamError;
use thiserror::Error;

/// Errors surfaced by the exchange facades
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("No {0} listener registered")]
    MissingListener(&'static str),

    #[error("Unsupported contract type: {0}")]
    UnsupportedContract(String),

    #[error("No contract {contract_type} listed for {pair}")]
    UnknownContract { pair: String, contract_type: String },

    #[error("Contract {symbol} is not trading (status {status})")]
    ContractNotTrading { symbol: String, status: String },

    #[error("Exchange metadata unavailable: {0}")]
    Metadata(String),
}
