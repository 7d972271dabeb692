//! RegistryClient tests against a mock XML-RPC endpoint.

use vpsync_registry::{RegistryClient, RegistryConfig, RegistryError};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(RegistryConfig {
        api_url: format!("{}/PLCAPI/", server.uri()),
        username: "ops@example.edu".to_string(),
        password: "hunter2".to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

fn xml_response(inner: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param>{inner}</param></params></methodResponse>"
    ))
}

#[tokio::test]
async fn test_auth_check_accepts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/PLCAPI/"))
        .and(body_string_contains("<methodName>AuthCheck</methodName>"))
        .and(body_string_contains("ops@example.edu"))
        .respond_with(xml_response("<value><int>1</int></value>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.auth_check().await.unwrap());
}

#[tokio::test]
async fn test_auth_check_fault_means_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<methodResponse><fault><value><struct>\
             <member><name>faultCode</name><value><int>103</int></value></member>\
             <member><name>faultString</name><value><string>bad password</string></value></member>\
             </struct></value></fault></methodResponse>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(!client.auth_check().await.unwrap());
}

#[tokio::test]
async fn test_get_nodes_decodes_listing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>GetNodes</methodName>"))
        .respond_with(xml_response(
            "<value><array><data>\
             <value><struct>\
               <member><name>node_id</name><value><int>14</int></value></member>\
               <member><name>hostname</name><value><string>pl1.example.edu</string></value></member>\
               <member><name>slice_ids</name><value><array><data>\
                 <value><int>22129</int></value>\
               </data></array></value></member>\
             </struct></value>\
             <value><struct>\
               <member><name>node_id</name><value><int>15</int></value></member>\
               <member><name>hostname</name><value><string>mlab1.example.org</string></value></member>\
               <member><name>slice_ids</name><value><array><data></data></array></value></member>\
             </struct></value>\
             </data></array></value>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let nodes = client.get_nodes().await.unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].node_id, 14);
    assert_eq!(nodes[0].hostname, "pl1.example.edu");
    assert_eq!(nodes[0].slice_ids, vec![22129]);
    assert_eq!(nodes[1].node_id, 15);
    assert!(nodes[1].slice_ids.is_empty());
}

#[tokio::test]
async fn test_get_slice_tags_sends_batch_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>GetSliceTags</methodName>"))
        .and(body_string_contains("ip_addresses"))
        .and(body_string_contains("<value><int>14</int></value>"))
        .and(body_string_contains("<value><int>15</int></value>"))
        .respond_with(xml_response(
            "<value><array><data>\
             <value><struct>\
               <member><name>node_id</name><value><int>15</int></value></member>\
               <member><name>value</name><value><string>10.0.0.2,10.0.0.3</string></value></member>\
             </struct></value>\
             </data></array></value>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let tags = client
        .get_slice_tags(&[14, 15], "ip_addresses")
        .await
        .unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].node_id, 15);
    assert_eq!(tags[0].value, "10.0.0.2,10.0.0.3");
}

#[tokio::test]
async fn test_add_slice_to_nodes_sends_hostnames() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>AddSliceToNodes</methodName>"))
        .and(body_string_contains("<value><int>22129</int></value>"))
        .and(body_string_contains("mlab1.example.org"))
        .respond_with(xml_response("<value><int>1</int></value>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .add_slice_to_nodes(22129, &["mlab1.example.org".to_string()])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_get_nodes_fault_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<methodResponse><fault><value><struct>\
             <member><name>faultCode</name><value><int>108</int></value></member>\
             <member><name>faultString</name><value><string>method failed</string></value></member>\
             </struct></value></fault></methodResponse>",
        ))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_nodes().await {
        Err(RegistryError::Fault { code, .. }) => assert_eq!(code, 108),
        other => panic!("expected fault, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.get_nodes().await {
        Err(RegistryError::Http(msg)) => assert!(msg.contains("500")),
        other => panic!("expected transport error, got {other:?}"),
    }
}
