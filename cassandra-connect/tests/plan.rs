use cassandra_connect::{
    CompressionSetting, Error, SessionBootstrap, StaticSecretStore, DEFAULT_DATA_CENTER,
};
use cassandra_uri::StaticTlsConfig;
use maplit::hashmap;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn bootstrap() -> SessionBootstrap {
    SessionBootstrap::new().with_ambient_tls(Arc::new(StaticTlsConfig::new()))
}

#[tokio::test]
async fn full_plan_from_uri_and_properties() {
    let mut driver_config = tempfile::NamedTempFile::new().unwrap();
    write!(driver_config, r#"{{"compression": "snappy"}}"#).unwrap();

    let store = StaticSecretStore::new().with_secret(
        "eu-west-1",
        "cassandra/prod",
        r#"{"username": "ignored", "password": "s3cr3t"}"#,
    );
    let bootstrap = bootstrap().with_secret_resolver(Arc::new(store));

    let uri = format!(
        "jdbc:cassandra://node1.example.com:9142,node2.example.com/orders.items\
         ?user=app&password=literal&dc=eu-west\
         &awsregion=eu-west-1&awssecretname=cassandra/prod&awssecretkey=password\
         &sslenabled=true&javax.net.ssl.truststore={FIXTURES}/client-bundle.pem\
         &javax.net.ssl.keystore={FIXTURES}/ca.pem"
    );
    let properties = hashmap! {
        "configfile".to_string() => driver_config.path().display().to_string(),
    };

    let config = bootstrap.parse(&uri, &properties).unwrap();
    assert!(!config.to_string().contains("literal"));

    let plan = bootstrap.plan(&config).await.unwrap();

    assert_eq!(
        plan.contact_points()
            .iter()
            .map(|contact_point| (contact_point.host(), contact_point.port()))
            .collect::<Vec<_>>(),
        vec![("node1.example.com", 9142), ("node2.example.com", 9142)]
    );
    assert_eq!(plan.keyspace(), Some("orders"));
    assert_eq!(plan.data_center(), "eu-west");
    assert_eq!(plan.settings().compression, Some(CompressionSetting::Snappy));

    let credentials = plan.credentials().unwrap();
    assert_eq!(credentials.user_name(), "app");
    assert_eq!(credentials.password().expose_secret(), "s3cr3t");

    let tls = plan.tls().unwrap();
    assert!(tls.config().client_auth_cert_resolver.has_certs());
}

#[tokio::test]
async fn pkcs12_key_store_drives_both_stores() {
    let uri = format!(
        "jdbc:cassandra://localhost?sslenabled=TRUE\
         &javax.net.ssl.keystore={FIXTURES}/keystore.p12&javax.net.ssl.keystorepassword=changeit"
    );

    let bootstrap = bootstrap();
    let config = bootstrap.parse(&uri, &HashMap::new()).unwrap();
    let plan = bootstrap.plan(&config).await.unwrap();

    assert_eq!(plan.data_center(), DEFAULT_DATA_CENTER);
    assert!(plan.credentials().is_none());
    assert!(plan
        .tls()
        .unwrap()
        .config()
        .client_auth_cert_resolver
        .has_certs());
}

#[tokio::test]
async fn wrong_key_store_password_fails_before_connecting() {
    let uri = format!(
        "jdbc:cassandra://localhost?sslenabled=true\
         &javax.net.ssl.keystore={FIXTURES}/keystore.p12&javax.net.ssl.keystorepassword=nope"
    );

    let result = bootstrap().connect(&uri, &HashMap::new()).await;

    assert!(matches!(result, Err(Error::TlsConfiguration(_))));
}

#[tokio::test]
async fn missing_store_files_are_not_loaded_without_ssl() {
    let bootstrap = bootstrap();
    let config = bootstrap
        .parse(
            "jdbc:cassandra://localhost?javax.net.ssl.truststore=/does/not/exist.p12",
            &HashMap::new(),
        )
        .unwrap();

    let plan = bootstrap.plan(&config).await.unwrap();

    assert!(plan.tls().is_none());
}
