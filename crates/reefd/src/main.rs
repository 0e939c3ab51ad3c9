//! reefd: a user-space NFSv3 server.
//!
//! Serves the portmapper on UDP/TCP 111, MOUNT v3 on TCP 892, and NFS v3
//! on TCP 2049 — the three services a stock kernel mounter probes, in
//! that order. Ctrl-C shuts all three down cooperatively.
//!
//! Mount the demo export with e.g.
//! `mount -t nfs -o vers=3 <host>:/volume1/Public /mnt`.

use reef_stream::{RpcService, Transport};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

async fn bind(svc: &mut RpcService, transport: Transport, address: &str) -> Result<(), String> {
    svc.add_listener(transport, address)
        .await
        .map(|_| ())
        .map_err(|error| format!("{} listener on {transport} {address}: {error}", svc.label()))
}

async fn run() -> Result<(), String> {
    let mut portmap = reef_portmap::service();
    bind(&mut portmap, Transport::Udp, "0.0.0.0:111").await?;
    bind(&mut portmap, Transport::Tcp, "0.0.0.0:111").await?;

    let mut mount = reef_mount::service();
    bind(&mut mount, Transport::Tcp, "0.0.0.0:892").await?;

    let mut nfs = reef_nfs::service();
    bind(&mut nfs, Transport::Tcp, "0.0.0.0:2049").await?;

    portmap.handle_clients();
    mount.handle_clients();
    nfs.handle_clients();
    info!(export = reef_mount::EXPORT_PATH, "serving");

    let handles = [
        portmap.shutdown_handle(),
        mount.shutdown_handle(),
        nfs.shutdown_handle(),
    ];
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            for handle in &handles {
                handle.shutdown();
            }
        }
    });

    portmap.wait_until_done().await;
    mount.wait_until_done().await;
    nfs.wait_until_done().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(message) = run().await {
        error!("{message}");
        eprintln!("Error: {message}");
        std::process::exit(1);
    }
}
