#[cfg(feature = "e2e-tests")]
use cassandra_connect::{CassandraSession, SessionBootstrap, StaticSecretStore};
#[cfg(feature = "e2e-tests")]
use maplit::hashmap;
#[cfg(feature = "e2e-tests")]
use std::collections::HashMap;
#[cfg(feature = "e2e-tests")]
use std::sync::Arc;

#[cfg(feature = "e2e-tests")]
const URI: &str = "jdbc:cassandra://127.0.0.1:9042/system?dc=datacenter1";

#[tokio::test]
#[cfg(feature = "e2e-tests")]
async fn connect_plain() {
    let session = SessionBootstrap::new()
        .connect(URI, &HashMap::new())
        .await
        .unwrap();

    let CassandraSession::Tcp(session) = session else {
        panic!("expected a plain session");
    };

    session
        .query("SELECT release_version FROM system.local")
        .await
        .expect("query local node");
}

#[tokio::test]
#[cfg(feature = "e2e-tests")]
async fn connect_with_secret_store_credentials() {
    // the default cluster setup accepts any credentials
    let store = StaticSecretStore::new().with_secret(
        "local",
        "cassandra",
        r#"{"password": "cassandra"}"#,
    );

    let session = SessionBootstrap::new()
        .with_secret_resolver(Arc::new(store))
        .connect(
            URI,
            &hashmap! {
                "user".to_string() => "cassandra".to_string(),
                "awsregion".to_string() => "local".to_string(),
                "awssecretname".to_string() => "cassandra".to_string(),
                "awssecretkey".to_string() => "password".to_string(),
            },
        )
        .await
        .unwrap();

    assert!(!session.is_tls());
}
