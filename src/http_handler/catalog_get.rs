use super::request_common::HTTPRequestType;
use super::response_common::{HTTPResponseType, ResponseError};

/// Remote source A: the bulk element catalog, a plain-text endpoint with
/// many three-line records.
#[derive(Debug)]
pub struct CatalogRequest {}

impl HTTPRequestType for CatalogRequest {
    type Response = CatalogResponse;

    fn endpoint(&self) -> &'static str { "" }
}

/// The full catalog body, scanned for one record by catalog number.
#[derive(Debug)]
pub struct CatalogResponse {
    body: String,
}

/// One raw three-line record lifted out of the catalog. The lines are kept
/// verbatim: validation is the parser's job, and the element cache
/// persists exactly these lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElementRecord {
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
}

impl HTTPResponseType for CatalogResponse {
    type ParsedResponseType = CatalogResponse;

    async fn read_response(
        response: reqwest::Response,
    ) -> Result<Self::ParsedResponseType, ResponseError> {
        let resp = Self::unwrap_return_code(response).await?;
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Err(ResponseError::MalformedBody);
        }
        Ok(CatalogResponse { body })
    }
}

impl CatalogResponse {
    /// Scans the catalog for the record whose second line carries
    /// `catalog_number`, returning its raw lines plus the name line that
    /// precedes them (when present).
    ///
    /// # Arguments
    /// * `catalog_number` - The catalog number to look for.
    ///
    /// # Returns
    /// The raw record, or `None` if no record matches.
    pub fn find_record(&self, catalog_number: u32) -> Option<RawElementRecord> {
        let lines: Vec<&str> = self.body.lines().map(str::trim_end).collect();
        for (i, pair) in lines.windows(2).enumerate() {
            let [line1, line2] = [pair[0], pair[1]];
            if !line1.starts_with("1 ") || !line2.starts_with("2 ") {
                continue;
            }
            let number = line2.get(2..7).and_then(|f| f.trim().parse::<u32>().ok());
            if number != Some(catalog_number) {
                continue;
            }
            let name = (i > 0)
                .then(|| lines[i - 1])
                .filter(|n| !n.starts_with("1 ") && !n.starts_with("2 ") && !n.is_empty())
                .map(|n| n.trim().to_string());
            return Some(RawElementRecord {
                name,
                line1: line1.to_string(),
                line2: line2.to_string(),
            });
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn test(body: &str) -> Self { Self { body: body.to_string() } }
}
