use cassandra_uri::{
    mask_password, password_value, ConnectionConfig, Error, StaticTlsConfig, UriOption,
};
use maplit::hashmap;
use secrecy::ExposeSecret;
use std::collections::HashMap;

fn resolved(config: &ConnectionConfig, option: UriOption) -> Option<String> {
    match option {
        UriOption::User => config.user_name().map(str::to_string),
        UriOption::Password => config.password().map(|p| p.expose_secret().clone()),
        UriOption::DataCenter => config.data_center().map(str::to_string),
        UriOption::SslEnabled => Some(config.ssl_enabled().to_string()),
        UriOption::TrustStore => config.trust_store().map(str::to_string),
        UriOption::TrustStorePassword => config
            .trust_store_password()
            .map(|p| p.expose_secret().clone()),
        UriOption::KeyStore => config.key_store().map(str::to_string),
        UriOption::KeyStorePassword => config
            .key_store_password()
            .map(|p| p.expose_secret().clone()),
        UriOption::AwsRegion => config.aws_region().map(str::to_string),
        UriOption::AwsSecretName => config.aws_secret_name().map(str::to_string),
        UriOption::AwsSecretKey => config.aws_secret_key().map(str::to_string),
        UriOption::ConfigFile => config
            .config_file()
            .map(|path| path.display().to_string()),
    }
}

#[test]
fn properties_win_for_every_option() {
    for option in UriOption::ALL {
        // sslenabled only survives parsing in its boolean form
        let (uri_value, property_value) = match option {
            UriOption::SslEnabled => ("false", "true"),
            _ => ("from-uri", "from-props"),
        };
        let uri = format!("jdbc:cassandra://h/ks?{}={}", option.key(), uri_value);
        let properties = hashmap! { option.key().to_string() => property_value.to_string() };

        let config =
            ConnectionConfig::parse_with(&uri, &properties, &StaticTlsConfig::new()).unwrap();

        assert_eq!(
            resolved(&config, option).as_deref(),
            Some(property_value),
            "{:?}",
            option
        );
    }
}

#[test]
fn uri_last_occurrence_wins_for_every_option() {
    for option in UriOption::ALL {
        let (first, last) = match option {
            UriOption::SslEnabled => ("false", "true"),
            _ => ("first", "last"),
        };
        let uri = format!(
            "jdbc:cassandra://h/ks?{key}={first}&{key}={last}",
            key = option.key()
        );

        let config =
            ConnectionConfig::parse_with(&uri, &HashMap::new(), &StaticTlsConfig::new()).unwrap();

        assert_eq!(resolved(&config, option).as_deref(), Some(last), "{:?}", option);
    }
}

#[test]
fn parsing_is_deterministic() {
    let uri = "jdbc:cassandra://a:1,b,c:3/ks.tbl?user=x&password=y&dc=z&sslenabled=true\
               &javax.net.ssl.truststore=/t&awsregion=r&awssecretname=n&awssecretkey=k";
    let properties = hashmap! { "dc".to_string() => "p".to_string() };
    let ambient = StaticTlsConfig::new().with_property("javax.net.ssl.keyStore", "/k");

    let first = ConnectionConfig::parse_with(uri, &properties, &ambient).unwrap();
    let second = ConnectionConfig::parse_with(uri, &properties, &ambient).unwrap();

    assert_eq!(first.hosts(), second.hosts());
    assert_eq!(first.keyspace(), second.keyspace());
    assert_eq!(first.collection(), second.collection());
    assert_eq!(first.data_center(), Some("p"));
    assert_eq!(first.key_store(), Some("/k"));
    assert_eq!(first.secret_coordinate(), second.secret_coordinate());
    for option in UriOption::ALL {
        assert_eq!(resolved(&first, option), resolved(&second, option));
    }
}

#[test]
fn malformed_uri_is_rejected() {
    for uri in ["", "jdbc:cassandra:/h", "JDBC:CASSANDRA://h", "cassandra://h"] {
        assert!(matches!(
            ConnectionConfig::parse_with(uri, &HashMap::new(), &StaticTlsConfig::new()),
            Err(Error::MalformedUri { .. })
        ));
    }
}

#[test]
fn masking_preserves_password_length() {
    let uri = "jdbc:cassandra://h/ks?user=u&password=s3cr3t&dc=d";
    let masked = mask_password(uri);

    assert_eq!(
        password_value(&masked).map(str::len),
        password_value(uri).map(str::len)
    );
    assert!(!masked.contains("s3cr3t"));
}
