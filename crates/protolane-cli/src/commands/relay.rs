//! Relay command implementation.

use crate::cli::RelayArgs;
use crate::error::convert_relay_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use protolane_core::HeaderOverrides;
use protolane_core::RelayConfig;
use protolane_core::RelayForwarder;
use protolane_core::RelayRequest;
use protolane_core::parse_header_overrides;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

pub fn execute(args: &RelayArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = RelayConfig {
        policy: args.policy,
        timeout: Duration::from_secs(args.timeout),
    };
    let request = RelayRequest {
        url: args.url.clone(),
        headers: collect_headers(args).map_err(|e| convert_relay_error(e, &args.url))?,
        payload: read_payload(args.payload.as_deref())?,
    };

    let forwarder = RelayForwarder::new(&config).map_err(|e| convert_relay_error(e, &args.url))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let response = runtime
        .block_on(forwarder.send(request))
        .map_err(|e| convert_relay_error(e, &args.url))?;

    if let Some(path) = &args.output {
        std::fs::write(path, &response.body)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
    }
    formatter.format_relay_result(&response, args.output.as_deref())?;
    if !(200..300).contains(&response.status) {
        formatter.format_warning(&format!("upstream answered {}", response.status));
    }

    Ok(())
}

/// `--headers` JSON first, then each `-H` pair on top.
fn collect_headers(args: &RelayArgs) -> protolane_core::Result<HeaderOverrides> {
    let mut headers = match &args.headers {
        Some(json) => parse_header_overrides(json)?,
        None => HeaderOverrides::new(),
    };
    for (name, value) in &args.header {
        headers.insert(name.clone(), value.as_str().into());
    }
    Ok(headers)
}

fn read_payload(source: Option<&Path>) -> Result<Vec<u8>> {
    match source {
        None => Ok(Vec::new()),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read payload from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read payload '{}'", path.display())),
    }
}
