//! Omail resource
//!
//! Email deployment lookups plus the opt-in/opt-out filter queues. Queue
//! submissions wrap a single entry in the envelope key the service expects
//! for that queue; entries are processed asynchronously on the Omeda side.

use serde::Serialize;
use serde_json::Value;

use super::{require_ids, require_non_empty, require_payload, IdList};
use crate::client::OmedaClient;
use crate::error::{OmedaError, Result};

const OPT_IN_QUEUE: &str = "optinfilterqueue/*";
const OPT_OUT_QUEUE: &str = "optoutfilterqueue/*";

const DEPLOYMENT_TYPE_OPT_IN: &str = "DeploymentTypeOptIn";
const BRAND_OPT_OUT: &str = "BrandOptOut";
const CLIENT_OPT_OUT: &str = "ClientOptOut";
const DEPLOYMENT_TYPE_OPT_OUT: &str = "DeploymentTypeOptOut";

/// Email deployment operations
#[derive(Debug)]
pub struct OmailApi<'a> {
    client: &'a OmedaClient,
}

impl<'a> OmailApi<'a> {
    /// Registry name for this resource
    pub const NAME: &'static str = "omail";

    pub(crate) fn new(client: &'a OmedaClient) -> Self {
        Self { client }
    }

    /// Fetch a deployment by its tracking id
    ///
    /// Issues `GET /brand/{brand_key}/omail/deployment/lookup/{track_id}/*`.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty track id;
    /// nothing is dispatched in that case.
    pub async fn deployment_lookup(&self, track_id: &str) -> Result<Value> {
        require_non_empty("track id", track_id)?;
        let endpoint =
            self.client.brand_endpoint(&format!("omail/deployment/lookup/{track_id}/*"))?;
        let response = self.client.get(&endpoint).await?;
        self.client.parse_api_response(response).await
    }

    /// Search deployments with caller-supplied criteria
    ///
    /// Issues `POST /brand/{brand_key}/omail/deployment/search/*` with the
    /// criteria forwarded verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty payload;
    /// nothing is dispatched in that case.
    pub async fn deployment_search(&self, criteria: Value) -> Result<Value> {
        require_payload("search criteria", &criteria)?;
        let endpoint = self.client.brand_endpoint("omail/deployment/search/*")?;
        let response = self.client.post(&endpoint, criteria).await?;
        self.client.parse_api_response(response).await
    }

    /// Queue an opt-in for one or more deployment types
    ///
    /// With `delete_opt_out` set, a standing opt-out for the same address
    /// is removed as part of processing the entry.
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty email address
    /// or an empty id list; nothing is dispatched in that case.
    pub async fn opt_in_deployment<I>(
        &self,
        email: &str,
        deployment_type_ids: I,
        delete_opt_out: bool,
        source: Option<&str>,
    ) -> Result<Value>
    where
        I: Into<IdList>,
    {
        let ids = deployment_type_ids.into();
        require_non_empty("email", email)?;
        require_ids("deployment type ids", &ids)?;

        let entry = FilterQueueEntry {
            email_address: email,
            deployment_type_id: Some(ids.into_inner()),
            brand_id: None,
            delete_opt_out: Some(u8::from(delete_opt_out)),
            source,
        };
        self.submit(OPT_IN_QUEUE, DEPLOYMENT_TYPE_OPT_IN, entry).await
    }

    /// Queue an opt-out from every deployment of the given brands
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty email address
    /// or an empty id list; nothing is dispatched in that case.
    pub async fn opt_out_brand<I>(
        &self,
        email: &str,
        brand_ids: I,
        source: Option<&str>,
    ) -> Result<Value>
    where
        I: Into<IdList>,
    {
        let ids = brand_ids.into();
        require_non_empty("email", email)?;
        require_ids("brand ids", &ids)?;

        let entry = FilterQueueEntry {
            email_address: email,
            deployment_type_id: None,
            brand_id: Some(ids.into_inner()),
            delete_opt_out: None,
            source,
        };
        self.submit(OPT_OUT_QUEUE, BRAND_OPT_OUT, entry).await
    }

    /// Queue an opt-out from everything the licensed client sends
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty email address;
    /// nothing is dispatched in that case.
    pub async fn opt_out_client(&self, email: &str, source: Option<&str>) -> Result<Value> {
        require_non_empty("email", email)?;

        let entry = FilterQueueEntry {
            email_address: email,
            deployment_type_id: None,
            brand_id: None,
            delete_opt_out: None,
            source,
        };
        self.submit(OPT_OUT_QUEUE, CLIENT_OPT_OUT, entry).await
    }

    /// Queue an opt-out from one or more deployment types
    ///
    /// # Errors
    ///
    /// Returns [`OmedaError::InvalidArgument`] for an empty email address
    /// or an empty id list; nothing is dispatched in that case.
    pub async fn opt_out_deployment<I>(
        &self,
        email: &str,
        deployment_type_ids: I,
        source: Option<&str>,
    ) -> Result<Value>
    where
        I: Into<IdList>,
    {
        let ids = deployment_type_ids.into();
        require_non_empty("email", email)?;
        require_ids("deployment type ids", &ids)?;

        let entry = FilterQueueEntry {
            email_address: email,
            deployment_type_id: Some(ids.into_inner()),
            brand_id: None,
            delete_opt_out: None,
            source,
        };
        self.submit(OPT_OUT_QUEUE, DEPLOYMENT_TYPE_OPT_OUT, entry).await
    }

    async fn submit(
        &self,
        queue: &str,
        envelope_key: &str,
        entry: FilterQueueEntry<'_>,
    ) -> Result<Value> {
        let endpoint = self.client.client_endpoint(queue)?;
        let response = self.client.post(&endpoint, envelope(envelope_key, entry)?).await?;
        self.client.parse_api_response(response).await
    }
}

/// One filter queue entry; unset fields stay off the wire
#[derive(Debug, Serialize)]
struct FilterQueueEntry<'a> {
    #[serde(rename = "EmailAddress")]
    email_address: &'a str,
    #[serde(rename = "DeploymentTypeId", skip_serializing_if = "Option::is_none")]
    deployment_type_id: Option<Vec<i64>>,
    #[serde(rename = "BrandId", skip_serializing_if = "Option::is_none")]
    brand_id: Option<Vec<i64>>,
    #[serde(rename = "DeleteOptOut", skip_serializing_if = "Option::is_none")]
    delete_opt_out: Option<u8>,
    #[serde(rename = "Source", skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

/// Wrap a single entry in the envelope key its queue expects
fn envelope(key: &str, entry: FilterQueueEntry<'_>) -> Result<Value> {
    let entry = serde_json::to_value(entry).map_err(|err| {
        OmedaError::InvalidArgument(format!("failed to serialize {key} entry: {err}"))
    })?;
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), Value::Array(vec![entry]));
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::INPUT_ID_HEADER;

    fn test_client(server: &MockServer) -> OmedaClient {
        OmedaClient::builder()
            .base_url(server.uri())
            .settings([
                ("client_key", "acme"),
                ("brand_key", "acmemag"),
                ("app_id", "C0FFEE-1234"),
                ("input_id", "7777"),
            ])
            .build()
            .expect("client")
    }

    #[tokio::test]
    async fn deployment_lookup_fetches_by_track_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/brand/acmemag/omail/deployment/lookup/ACM240801/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "TrackId": "ACM240801",
                "Status": "SENT",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let deployment = client.omail().deployment_lookup("ACM240801").await.expect("deployment");

        assert_eq!(deployment["Status"], "SENT");
    }

    #[tokio::test]
    async fn deployment_lookup_rejects_empty_track_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.omail().deployment_lookup("  ").await.unwrap_err();

        assert!(matches!(err, OmedaError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn deployment_search_posts_criteria() {
        let server = MockServer::start().await;
        let criteria = json!({"Statuses": ["SENT"], "NumResults": 10});
        Mock::given(method("POST"))
            .and(path("/brand/acmemag/omail/deployment/search/*"))
            .and(header(INPUT_ID_HEADER, "7777"))
            .and(body_json(criteria.clone()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Deployments": [{"TrackId": "A"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let results = client.omail().deployment_search(criteria).await.expect("results");

        assert_eq!(results["Deployments"][0]["TrackId"], "A");
    }

    #[tokio::test]
    async fn deployment_search_rejects_empty_criteria() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.omail().deployment_search(json!({})).await.unwrap_err();

        assert!(matches!(err, OmedaError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn opt_in_posts_expected_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/acme/optinfilterqueue/*"))
            .and(body_json(json!({
                "DeploymentTypeOptIn": [{
                    "EmailAddress": "reader@example.com",
                    "DeploymentTypeId": [3, 4],
                    "DeleteOptOut": 1,
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SubmissionId": "1a"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let ack = client
            .omail()
            .opt_in_deployment("reader@example.com", [3i64, 4], true, None)
            .await
            .expect("acknowledgement");

        assert_eq!(ack["SubmissionId"], "1a");
    }

    #[tokio::test]
    async fn opt_out_brand_posts_expected_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/acme/optoutfilterqueue/*"))
            .and(body_json(json!({
                "BrandOptOut": [{
                    "EmailAddress": "reader@example.com",
                    "BrandId": [9],
                    "Source": "preference center",
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SubmissionId": "2b"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .omail()
            .opt_out_brand("reader@example.com", 9i64, Some("preference center"))
            .await
            .expect("acknowledgement");
    }

    #[tokio::test]
    async fn opt_out_client_posts_expected_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/acme/optoutfilterqueue/*"))
            .and(body_json(json!({
                "ClientOptOut": [{"EmailAddress": "reader@example.com"}],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SubmissionId": "3c"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.omail().opt_out_client("reader@example.com", None).await.expect("acknowledgement");
    }

    #[tokio::test]
    async fn opt_out_deployment_normalizes_single_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/acme/optoutfilterqueue/*"))
            .and(body_json(json!({
                "DeploymentTypeOptOut": [{
                    "EmailAddress": "reader@example.com",
                    "DeploymentTypeId": [3],
                }],
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"SubmissionId": "4d"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .omail()
            .opt_out_deployment("reader@example.com", 3i64, None)
            .await
            .expect("acknowledgement");
    }

    #[tokio::test]
    async fn queue_methods_reject_empty_email_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let omail = client.omail();

        assert!(matches!(
            omail.opt_in_deployment("", [3i64], true, None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
        assert!(matches!(
            omail.opt_out_brand("", [9i64], None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
        assert!(matches!(
            omail.opt_out_client("", None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
        assert!(matches!(
            omail.opt_out_deployment("", [3i64], None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn queue_methods_reject_empty_id_lists_before_dispatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let omail = client.omail();
        let none: Vec<i64> = Vec::new();

        assert!(matches!(
            omail.opt_in_deployment("reader@example.com", none.clone(), true, None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
        assert!(matches!(
            omail.opt_out_brand("reader@example.com", none.clone(), None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
        assert!(matches!(
            omail.opt_out_deployment("reader@example.com", none, None).await,
            Err(OmedaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn entry_serialization_skips_unset_fields() {
        let entry = FilterQueueEntry {
            email_address: "reader@example.com",
            deployment_type_id: Some(vec![3]),
            brand_id: None,
            delete_opt_out: Some(1),
            source: None,
        };

        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(
            value,
            json!({
                "EmailAddress": "reader@example.com",
                "DeploymentTypeId": [3],
                "DeleteOptOut": 1,
            })
        );
    }

    #[test]
    fn envelope_wraps_entry_in_list() {
        let entry = FilterQueueEntry {
            email_address: "reader@example.com",
            deployment_type_id: None,
            brand_id: None,
            delete_opt_out: None,
            source: Some("import"),
        };

        let value = envelope(CLIENT_OPT_OUT, entry).unwrap();
        assert_eq!(
            value,
            json!({
                "ClientOptOut": [{"EmailAddress": "reader@example.com", "Source": "import"}],
            })
        );
    }
}
