//! A thin command-line client over `dnslib`: parse arguments, build a
//! `Resolver`, print the response. All DNS logic lives in the library; this
//! binary is just an adapter from argv to `Resolver::resolve`.
use std::str::FromStr;
use std::time::Duration;

use clap::{App, Arg};

use dnslib::error::DNSResult;
use dnslib::rfc1035::{QClass, QType};
use dnslib::{ResolverConfig, TransportType};

struct CliOptions {
    qtype: QType,
    qclass: QClass,
    ns: String,
    domain: String,
    tcp: bool,
    timeout_ms: u64,
    retries: u32,
    no_cache: bool,
    debug: bool,
}

impl CliOptions {
    fn parse() -> DNSResult<Self> {
        let matches = App::new("DNS query tool")
            .version("0.2")
            .about(
                r#"A simple DNS query client

            "#,
            )
            .arg(
                Arg::new("qtype")
                    .short('q')
                    .long("qtype")
                    .required(true)
                    .long_help("QType value, e.g. A, AAAA, MX, TXT")
                    .takes_value(true),
            )
            .arg(
                Arg::new("qclass")
                    .short('c')
                    .long("qclass")
                    .required(false)
                    .long_help("QClass value, defaults to IN")
                    .takes_value(true),
            )
            .arg(
                Arg::new("ns")
                    .short('n')
                    .long("ns")
                    .required(true)
                    .long_help("DNS server to address")
                    .takes_value(true),
            )
            .arg(
                Arg::new("domain")
                    .short('d')
                    .long("domain")
                    .required(true)
                    .long_help("Domain to query")
                    .takes_value(true),
            )
            .arg(
                Arg::new("tcp")
                    .short('t')
                    .long("tcp")
                    .required(false)
                    .long_help("Use TCP instead of UDP")
                    .takes_value(false),
            )
            .arg(
                Arg::new("timeout")
                    .long("timeout")
                    .required(false)
                    .long_help("Per-attempt timeout in milliseconds")
                    .takes_value(true),
            )
            .arg(
                Arg::new("retries")
                    .long("retries")
                    .required(false)
                    .long_help("Number of attempts before giving up")
                    .takes_value(true),
            )
            .arg(
                Arg::new("no-cache")
                    .long("no-cache")
                    .required(false)
                    .long_help("Disable the response cache")
                    .takes_value(false),
            )
            .arg(
                Arg::new("debug")
                    .short('g')
                    .long("debug")
                    .required(false)
                    .long_help("Debug mode")
                    .takes_value(false),
            )
            .get_matches();

        let qtype = QType::from_str(matches.value_of("qtype").unwrap())?;
        let qclass = match matches.value_of("qclass") {
            Some(s) => QClass::from_str(s)?,
            None => QClass::IN,
        };

        Ok(CliOptions {
            qtype,
            qclass,
            ns: matches.value_of("ns").unwrap().to_string(),
            domain: matches.value_of("domain").unwrap().to_string(),
            tcp: matches.is_present("tcp"),
            timeout_ms: matches
                .value_of("timeout")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
            retries: matches
                .value_of("retries")
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            no_cache: matches.is_present("no-cache"),
            debug: matches.is_present("debug"),
        })
    }
}

fn main() -> DNSResult<()> {
    let options = CliOptions::parse()?;

    if options.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let config = ResolverConfig::new()
        .add_server(&options.ns)?
        .with_timeout(Duration::from_millis(options.timeout_ms))
        .with_retries(options.retries)
        .with_transport(if options.tcp {
            TransportType::Tcp
        } else {
            TransportType::Udp
        })
        .with_cache(!options.no_cache);

    let resolver = dnslib::Resolver::new(config).with_listener(|msg| log::debug!("{}", msg));

    println!("QUERY: {} {} {}", options.domain, options.qclass, options.qtype);
    let response = resolver.resolve(&options.domain, options.qtype, options.qclass);

    if let Some(err) = &response.error {
        eprintln!("query failed: {}", err);
        std::process::exit(1);
    }

    print!("{}", response);
    Ok(())
}
