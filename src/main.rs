use std::rc::Rc;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use panelkit::config::{Cli, ConfigError};
use panelkit::controller::{Controller, ControllerError};
use panelkit::dom::MemoryDom;
use panelkit::hub::HubEvent;
use panelkit::owner::JsonResponseOwner;
use panelkit::panel::{Id, Panel, RequestDescriptor};
use panelkit::template::{self, TemplateError};
use panelkit::transport::HttpTransport;

const PANEL_NAME: &str = "main";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),

    #[error("event hub closed before a response arrived")]
    HubClosed,
}

fn parse_id(raw: String) -> Id {
    raw.parse::<i64>().map(Id::Num).unwrap_or(Id::Text(raw))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "panelkit=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    tracing::info!(url = %cli.url, attach = %cli.attach, "panelkit starting");

    let render_fn = template::compile(&cli.load_template()?)?;
    let dom = Rc::new(MemoryDom::new());
    dom.mount(cli.attach.clone());

    let panel = Panel::new(
        Rc::new(JsonResponseOwner::new(cli.url.clone())),
        dom.clone(),
        Rc::new(HttpTransport::default()),
        render_fn,
        cli.attach.clone(),
        None,
    )
    .with_fetch(RequestDescriptor::get(cli.url.clone()));

    let mut controller = Controller::new();
    controller.add(PANEL_NAME, panel)?;
    let ids = cli.ids.iter().cloned().map(parse_id).collect();
    controller.activate(PANEL_NAME, Some(ids))?;

    let timeout = cli.timeout();
    loop {
        let event = tokio::time::timeout(timeout, controller.next_event())
            .await
            .map_err(|_| AppError::Timeout(timeout))?
            .ok_or(AppError::HubClosed)?;
        match event {
            HubEvent::Response { status, .. } => {
                tracing::info!(status, "response rendered");
                break;
            }
            HubEvent::Failure { reason, .. } => {
                tracing::warn!(%reason, "request failed");
                break;
            }
            HubEvent::App { .. } => continue,
        }
    }

    println!("{}", dom.content(&cli.attach).unwrap_or_default());
    Ok(())
}
