use crate::config::{self, MimeOverrides};
use crate::err::Error;
use clap::{ArgAction, Parser};
use http::header::{HeaderName, HeaderValue};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Serve a directory of static files over HTTP
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(
        help = "Socket address to listen on (--help for more)",
        long_help = r"Socket address to listen on:
Examples:
    - 127.0.0.1:3000
    - 0.0.0.0:80
    - [2001:db8::1]:8080"
    )]
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Directory to serve
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Document served when a directory is requested; pass '' to disable
    #[arg(long, default_value = "index.html")]
    pub default_document: String,

    /// Render an HTML listing when a directory is requested
    #[arg(long)]
    pub listing: bool,

    /// File served in place of misses, with its own content-type resolution
    #[arg(long)]
    pub not_found: Option<PathBuf>,

    #[arg(
        help = "Extension-to-content-type overrides (--help for more)",
        long_help = r#"Extension-to-content-type overrides:
    - a JSON object, inline or @path to read it from a file
    - keys are extensions without the dot; '.' matches extensionless
      files and '*' anything not listed
    - an empty-string value disables the extension
Examples:
    - {"ttf": ""}
    - {"*": "", "html": "text/html"}
    - @mime.json"#
    )]
    #[arg(long, value_parser = config::parse_mime_overrides)]
    pub mime: Option<MimeOverrides>,

    /// Extra response header as 'Name: value', applied to non-404 responses
    #[arg(long = "header", value_parser = header)]
    pub headers: Vec<(HeaderName, HeaderValue)>,

    /// Terminate TLS (self-signed certificate unless --tls-cert/--tls-key given)
    #[arg(long)]
    pub tls: bool,

    /// PEM certificate chain for TLS
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key for TLS
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

fn header(arg: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let (name, value) = arg
        .split_once(':')
        .ok_or("expected 'Name: value'")?;
    Ok((name.trim().parse()?, value.trim().parse()?))
}
