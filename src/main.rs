mod body;
mod config;
mod dispatch;
mod err;
mod events;
mod http;
mod listing;
mod mime;
mod opt;
mod resolve;
mod respond;
mod tls;

use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), err::DisplayError> {
    let opt::Options {
        verbose,
        listen,
        root,
        default_document,
        listing,
        not_found,
        mime,
        headers,
        tls,
        tls_cert,
        tls_key,
    } = clap::Parser::parse();

    env_logger::Builder::new()
        .filter_level(match verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .init();

    let acceptor = match (tls, tls_cert, tls_key) {
        (_, Some(cert), Some(key)) => {
            let cert_pem = std::fs::read(cert)?;
            let key_pem = std::fs::read(key)?;
            Some(tls::acceptor_from_pem(&cert_pem, &key_pem)?)
        }
        (true, _, _) => {
            log::warn!("No certificate provided, using a self-signed fallback");
            Some(tls::acceptor_self_signed()?)
        }
        (false, _, _) => None,
    };

    let state = dispatch::State::new(
        config::ServerConfig {
            root,
            default_document,
            listing,
            not_found,
            headers,
        },
        mime::MimeMap::new(mime.unwrap_or_default()),
        Arc::new(events::LogSink),
    );

    http::run_server(
        listen,
        acceptor,
        state,
        dispatch::respond_to_request::<hyper::body::Incoming>,
    )
    .await?;

    Ok(())
}
