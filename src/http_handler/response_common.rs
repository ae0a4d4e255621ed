use strum_macros::Display;

/// Failure modes of a remote fetch. The resolution engine folds every
/// variant into its `SourceUnavailable` category and moves to the next
/// tier; no distinction triggers a retry.
#[derive(Debug, Display)]
pub enum ResponseError {
    /// The request timed out or the connection could not be established.
    NoConnection,
    /// The source answered with a server-side error status.
    InternalServer,
    /// The source answered with a client-side error status.
    BadRequest,
    /// The body arrived but did not decode as the expected payload.
    MalformedBody,
    /// Anything else.
    Unknown,
}

impl std::error::Error for ResponseError {}

impl From<reqwest::Error> for ResponseError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() || value.is_connect() {
            ResponseError::NoConnection
        } else if value.is_decode() || value.is_body() {
            ResponseError::MalformedBody
        } else {
            ResponseError::Unknown
        }
    }
}

/// Shared response machinery: a response type knows how to turn a raw
/// `reqwest::Response` into its parsed form.
pub(crate) trait HTTPResponseType {
    type ParsedResponseType;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>;

    async fn unwrap_return_code(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ResponseError> {
        if response.status().is_success() {
            Ok(response)
        } else if response.status().is_server_error() {
            Err(ResponseError::InternalServer)
        } else if response.status().is_client_error() {
            Err(ResponseError::BadRequest)
        } else {
            Err(ResponseError::Unknown)
        }
    }
}

/// Responses with a JSON body.
pub(crate) trait JSONBodyHTTPResponseType: HTTPResponseType {
    async fn parse_json_body(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError>
    where Self::ParsedResponseType: for<'de> serde::Deserialize<'de> {
        Ok(response.json::<Self::ParsedResponseType>().await?)
    }
}

/// Marker trait: a serde-deserializable type that *is* its own parsed
/// JSON response. Gets `HTTPResponseType` for free.
pub(crate) trait SerdeJSONBodyHTTPResponseType {}

impl<T> JSONBodyHTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
}

impl<T> HTTPResponseType for T
where
    T: SerdeJSONBodyHTTPResponseType,
    for<'de> T: serde::Deserialize<'de>,
{
    type ParsedResponseType = T;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let resp = Self::unwrap_return_code(response).await?;
        Self::parse_json_body(resp).await
    }
}
