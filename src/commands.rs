//! Executes parsed CLI commands against the file store.

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::{Cli, Command};
use crate::config::TrackerConfig;
use crate::driver::{ProcessDriver, load_process};
use crate::process::{EntityId, ErrorRecord, Process};
use crate::store::FileStore;
use crate::ui::{self, DeliveryProgress};
use crate::webhook::{HttpTransport, WebhookEndpoints};

fn error_record(message: String, entity: Option<EntityId>) -> ErrorRecord {
    match entity {
        Some(entity) => ErrorRecord::with_entity(message, entity),
        None => ErrorRecord::new(message),
    }
}

fn webhooks(cli: &Cli, config: &TrackerConfig) -> Result<Option<(WebhookEndpoints, HttpTransport)>> {
    if !cli.notify {
        return Ok(None);
    }
    let Some(endpoints) = config.webhooks.clone() else {
        bail!("--notify requires a [webhooks] table in the config file");
    };
    let transport = HttpTransport::with_timeouts(
        config.client_id.clone(),
        config.connect_timeout(),
        config.timeout(),
    )?;
    Ok(Some((endpoints, transport)))
}

pub async fn run(cli: Cli, config: TrackerConfig) -> Result<()> {
    let company_id = cli.company.unwrap_or(config.company_id);
    let store = FileStore::new(&config.store_dir);
    let webhooks = webhooks(&cli, &config)?;

    let id = match &cli.command {
        Command::Create {
            plugin,
            description,
        } => {
            let mut process = Process::new(company_id, plugin.unwrap_or(config.plugin_id));
            if let Some(description) = description {
                process = process.with_description(description.clone());
            }
            let driver = ProcessDriver::attach(process, store, webhooks);
            driver.save()?;
            info!(process_id = %driver.process().id(), company_id, "process created");
            println!("{}", driver.process().id());
            return Ok(());
        }
        Command::Init { id, .. }
        | Command::Handle { id, .. }
        | Command::Skip { id, .. }
        | Command::Error { id, .. }
        | Command::Terminate { id, .. }
        | Command::Finish { id, .. }
        | Command::State { id, .. }
        | Command::Describe { id, .. }
        | Command::Show { id } => id.clone(),
    };

    let process = load_process(&store, company_id, &id)?;
    if let Command::Show { .. } = cli.command {
        ui::print_snapshot(&process);
        return Ok(());
    }

    let notifying = webhooks.is_some();
    let mut driver = ProcessDriver::attach(process, store, webhooks);
    let progress = notifying.then(|| DeliveryProgress::start("delivering webhooks"));

    let outcome = match cli.command {
        Command::Init { count, .. } => driver.initialize(count).await,
        Command::Handle { count, .. } => driver.handle(count).await,
        Command::Skip { count, .. } => driver.skip(count).await,
        Command::Error {
            message, entity, ..
        } => driver.add_errors(vec![error_record(message, entity)]).await,
        Command::Terminate {
            message, entity, ..
        } => driver.terminate(error_record(message, entity)).await,
        Command::Finish { value, .. } => driver.finish(value).await,
        Command::State { state, .. } => match state.parse() {
            Ok(state) => driver.set_state(state),
            Err(e) => Err(e.into()),
        },
        Command::Describe { description, .. } => driver.set_description(Some(description)),
        Command::Create { .. } | Command::Show { .. } => Ok(()),
    };

    if let Some(progress) = progress {
        progress.finish();
    }

    match outcome {
        Ok(()) => {
            ui::print_summary(driver.process());
            Ok(())
        }
        Err(e) if e.is_delivery() => {
            // The state change is already saved; only the notification failed.
            ui::print_summary(driver.process());
            ui::print_failure(&e.to_string());
            Err(e.into())
        }
        Err(e) => {
            ui::print_failure(&e.to_string());
            Err(e.into())
        }
    }
}
