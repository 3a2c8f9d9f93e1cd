use fanout_core::config::Config;

/// Run the HTTP server in the foreground until Ctrl-C.
pub fn run(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
        let actual = listener.local_addr()?;
        println!("fanout server → http://{actual}");
        fanout_server::serve_on(config, listener).await
    })
}
