use clap::builder::PossibleValue;
use clap::{crate_description, crate_name, crate_version, Arg, ArgAction, Command};

use crate::config::{DEFAULT_PROVISIONER_REGEX, PROVISIONER_REGEX_ENV_VAR};
use crate::quota_injector::BLOCK_DEVICE_RESOURCE;

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("10250")
            .env("WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("/certs/tls.crt")
            .env("WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS. Leave empty to serve plain HTTP"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("/certs/tls.key")
            .env("WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS. Leave empty to serve plain HTTP"),
        Arg::new("provisioner-regex")
            .long("provisioner-regex")
            .value_name("REGEX")
            .default_value(DEFAULT_PROVISIONER_REGEX)
            .env(PROVISIONER_REGEX_ENV_VAR)
            .help("Regular expression matching the storage provisioners that provide block devices"),
        Arg::new("block-device-resource")
            .long("block-device-resource")
            .value_name("RESOURCE_NAME")
            .default_value(BLOCK_DEVICE_RESOURCE)
            .env("BLOCK_DEVICE_RESOURCE")
            .help("Name of the extended resource used to account the block devices"),
        Arg::new("lookup-timeout")
            .long("lookup-timeout")
            .value_name("SECONDS")
            .default_value("10")
            .env("WEBHOOK_LOOKUP_TIMEOUT")
            .value_parser(clap::value_parser!(u64).range(1..))
            .help("Maximum time to wait for a PersistentVolumeClaim lookup"),
        Arg::new("ignore-kubernetes-connection-failure")
            .long("ignore-kubernetes-connection-failure")
            .env("WEBHOOK_IGNORE_KUBERNETES_CONNECTION_FAILURE")
            .action(ArgAction::SetTrue)
            .help("Do not exit with an error if the Kubernetes connection fails. All the PersistentVolumeClaims will be considered block devices."),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
