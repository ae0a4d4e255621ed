use super::http_client::HTTPClient;
use super::response_common::{HTTPResponseType, ResponseError};

/// A GET request against one of the remote position sources.
///
/// Both sources are read-only; the engine never sends a body. The default
/// `send_request` builds the URL from the client's base URL and the
/// request's endpoint, performs the call and hands the response to the
/// associated response type.
pub(crate) trait HTTPRequestType {
    type Response: HTTPResponseType;

    /// Path appended to the client's base URL (may be empty when the base
    /// URL already names the resource).
    fn endpoint(&self) -> &str;

    async fn send_request(
        &self,
        client: &HTTPClient,
    ) -> Result<<Self::Response as HTTPResponseType>::ParsedResponseType, ResponseError> {
        let url = format!("{}{}", client.url(), self.endpoint());
        let response = client.client().get(url).send().await?;
        Self::Response::read_response(response).await
    }
}
