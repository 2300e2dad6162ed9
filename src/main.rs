//! Skirmish server binary.
//!
//! Wires the TCP listener to the engine loop: inbound actions funnel
//! through a bounded queue into the single dispatch task, and outbound
//! messages fan back out through the broadcaster.

use anyhow::Result;
use tokio::sync::mpsc;

use skirmish::server::{run_dispatch, run_server, Broadcaster, InboundEvent, Outbound, ServerConfig};

fn main() -> Result<()> {
    let config = ServerConfig::from_env();
    let max_pending = config.max_pending_actions.max(1);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let (event_tx, event_rx) = mpsc::channel::<InboundEvent>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();

        tokio::spawn(run_dispatch(event_rx, Broadcaster::new(out_tx)));
        run_server(config, event_tx, out_rx, None).await
    })
}
