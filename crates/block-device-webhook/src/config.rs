use anyhow::{anyhow, Result};
use clap::ArgMatches;
use lazy_static::lazy_static;
use regex::Regex;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub static SERVICE_NAME: &str = "block-device-webhook";

/// Environment variable holding the provisioner allow-list
pub const PROVISIONER_REGEX_ENV_VAR: &str = "PROVISIONER_REGEX";
pub const DEFAULT_PROVISIONER_REGEX: &str = "cinder|vsphere";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub provisioner_regex: Regex,
    pub block_device_resource: String,
    pub lookup_timeout: Duration,
    pub ignore_kubernetes_connection_failure: bool,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let provisioner_regex = provisioner_regex(matches)?;
        let block_device_resource = matches
            .get_one::<String>("block-device-resource")
            .expect("This should not happen, there's a default value for block-device-resource")
            .to_owned();
        let lookup_timeout = Duration::from_secs(
            *matches
                .get_one::<u64>("lookup-timeout")
                .expect("This should not happen, there's a default value for lookup-timeout"),
        );
        let ignore_kubernetes_connection_failure = matches
            .get_one::<bool>("ignore-kubernetes-connection-failure")
            .expect("clap should have set a default value")
            .to_owned();

        let log_level = matches
            .get_one::<String>("log-level")
            .expect("This should not happen, there's a default value for log-level")
            .to_owned();
        let log_fmt = matches
            .get_one::<String>("log-fmt")
            .expect("This should not happen, there's a default value for log-fmt")
            .to_owned();
        let log_no_color = matches
            .get_one::<bool>("log-no-color")
            .expect("clap should have assigned a default value")
            .to_owned();

        let (cert_file, key_file) = tls_files(matches)?;
        let tls_config = if cert_file.is_empty() {
            None
        } else {
            Some(TlsConfig {
                cert_file: PathBuf::from(cert_file),
                key_file: PathBuf::from(key_file),
            })
        };

        Ok(Self {
            addr,
            tls_config,
            provisioner_regex,
            block_device_resource,
            lookup_timeout,
            ignore_kubernetes_connection_failure,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn api_bind_address(matches: &clap::ArgMatches) -> Result<SocketAddr> {
    let address = matches
        .get_one::<String>("address")
        .ok_or_else(|| anyhow!("error parsing arguments: missing bind address"))?;
    let port = matches
        .get_one::<String>("port")
        .ok_or_else(|| anyhow!("error parsing arguments: missing port"))?;

    format!("{address}:{port}")
        .parse()
        .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_files(matches: &clap::ArgMatches) -> Result<(String, String)> {
    let cert_file = matches
        .get_one::<String>("cert-file")
        .cloned()
        .unwrap_or_default();
    let key_file = matches
        .get_one::<String>("key-file")
        .cloned()
        .unwrap_or_default();
    if cert_file.is_empty() != key_file.is_empty() {
        Err(anyhow!("error parsing arguments: either both --cert-file and --key-file must be provided, or neither"))
    } else {
        Ok((cert_file, key_file))
    }
}

fn provisioner_regex(matches: &clap::ArgMatches) -> Result<Regex> {
    let pattern = matches
        .get_one::<String>("provisioner-regex")
        .expect("This should not happen, there's a default value for provisioner-regex");

    Regex::new(pattern)
        .map_err(|e| anyhow!("error compiling provisioner regex {:?}: {}", pattern, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;
    use crate::quota_injector::BLOCK_DEVICE_RESOURCE;
    use rstest::rstest;

    fn config_from(flags: &[&str]) -> Result<Config> {
        let mut args = vec!["block-device-webhook"];
        args.extend(flags);
        let matches = cli::build_cli().try_get_matches_from(args).unwrap();
        Config::from_args(&matches)
    }

    #[test]
    fn default_values() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr, "0.0.0.0:10250".parse().unwrap());
        assert_eq!(config.provisioner_regex.as_str(), DEFAULT_PROVISIONER_REGEX);
        assert_eq!(config.block_device_resource, BLOCK_DEVICE_RESOURCE);
        assert_eq!(config.lookup_timeout, Duration::from_secs(10));
        assert!(!config.ignore_kubernetes_connection_failure);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_fmt, "text");

        let tls_config = config.tls_config.expect("TLS should be enabled by default");
        assert_eq!(tls_config.cert_file, PathBuf::from("/certs/tls.crt"));
        assert_eq!(tls_config.key_file, PathBuf::from("/certs/tls.key"));
    }

    #[test]
    fn plain_http_when_no_certificate_is_given() {
        let config = config_from(&["--cert-file=", "--key-file="]).unwrap();
        assert!(config.tls_config.is_none());
    }

    #[rstest]
    #[case::only_cert(&["--key-file="])]
    #[case::only_key(&["--cert-file="])]
    fn cert_and_key_go_together(#[case] flags: &[&str]) {
        assert!(config_from(flags).is_err());
    }

    #[test]
    fn invalid_provisioner_regex() {
        let err = config_from(&["--provisioner-regex=cinder|(vsphere"])
            .err()
            .expect("the regex should not compile");
        assert!(err.to_string().contains("error compiling provisioner regex"));
    }

    #[test]
    fn custom_values() {
        let config = config_from(&[
            "--provisioner-regex=^ebs\\.csi\\.aws\\.com$",
            "--block-device-resource=example.com/disks",
            "--addr=127.0.0.1",
            "--port=8443",
            "--lookup-timeout=3",
            "--log-fmt=json",
        ])
        .unwrap();

        assert!(config.provisioner_regex.is_match("ebs.csi.aws.com"));
        assert!(!config.provisioner_regex.is_match("kubernetes.io/cinder"));
        assert_eq!(config.block_device_resource, "example.com/disks");
        assert_eq!(config.addr, "127.0.0.1:8443".parse().unwrap());
        assert_eq!(config.lookup_timeout, Duration::from_secs(3));
        assert_eq!(config.log_fmt, "json");
    }

    #[test]
    fn boolean_flags() {
        for provide_flag in [true, false] {
            let mut flags = vec![];
            if provide_flag {
                flags.extend(["--log-no-color", "--ignore-kubernetes-connection-failure"]);
            }

            let config = config_from(&flags).unwrap();
            assert_eq!(provide_flag, config.log_no_color);
            assert_eq!(provide_flag, config.ignore_kubernetes_connection_failure);
        }
    }

    #[test]
    fn zero_lookup_timeout_is_rejected() {
        let res = cli::build_cli()
            .try_get_matches_from(["block-device-webhook", "--lookup-timeout=0"]);
        assert!(res.is_err());
    }
}
