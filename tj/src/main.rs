//! TaskJournal - task tracker driven by game events
//!
//! CLI entry point standing in for the host: it loads a save's task lists,
//! raises game events against them and writes them back.

use std::fs;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use parking_lot::Mutex;
use tracing::info;

use journalstore::FileStore;
use taskjournal::catalog::{Catalog, StaticCatalog};
use taskjournal::cli::{Cli, Command, EventCommand};
use taskjournal::config::Config;
use taskjournal::date::{Period, WorldDate};
use taskjournal::domain::{Building, FarmAnimal, Item, PlayerId};
use taskjournal::error::JournalError;
use taskjournal::events::{
    BuildingConstructed, FarmAnimalTraded, InventoryChanged, ItemGifted, ItemReceived, SalablePurchased, SalableSold,
    TaskEvents, TaskStatusChanged,
};
use taskjournal::factory::{TaskFactory, TaskRegistry};
use taskjournal::list::TaskList;
use taskjournal::manager::TaskManager;
use taskjournal::task::{TaskHandle, TaskState};

fn setup_logging(config: &Config, cli_level: Option<&str>) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // CLI flag wins over config; INFO when neither is set
    let level = cli_level.or(config.log_level.as_deref()).unwrap_or("info");
    let level: tracing::Level = level.parse().map_err(|_| eyre!("Invalid log level: {}", level))?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("tj.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

fn load_catalog(config: &Config) -> Result<StaticCatalog> {
    match &config.catalog.path {
        Some(path) => StaticCatalog::load(path).context(format!("Failed to load catalog from {}", path.display())),
        None => StaticCatalog::builtin().context("Failed to load built-in catalog"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(&config, cli.log_level.as_deref()).context("Failed to setup logging")?;

    let catalog = load_catalog(&config)?;
    let store = FileStore::open(config.data_dir()).context("Failed to open data store")?;
    let events = Arc::new(TaskEvents::local(config.mod_id.clone()));
    let mut manager = TaskManager::new(events, TaskRegistry::builtin(), Arc::new(store));

    let save_id = cli.save.clone().unwrap_or_else(|| config.session.save_id.clone());
    let player = cli.player.map(PlayerId).unwrap_or_else(|| config.session.player());
    info!(%save_id, %player, "tj starting");
    manager
        .load(&save_id, player)
        .context(format!("Failed to load tasks of save '{}'", save_id))?;

    let changed = match cli.command {
        Command::Kinds => {
            cmd_kinds(manager.registry());
            false
        }
        Command::List { all } => {
            cmd_list(&manager, &config, player, all);
            false
        }
        Command::Add {
            kind,
            name,
            params,
            renew,
            renew_on,
        } => {
            cmd_add(&mut manager, &catalog, &kind, &name, &params, renew.zip(renew_on))?;
            true
        }
        Command::Edit { index, params, name } => {
            cmd_edit(&mut manager, &catalog, index, &params, name.as_deref())?;
            true
        }
        Command::Remove { index } => {
            let removed = manager.tasks()?.remove_at(index).ok_or(JournalError::NoSuchTask(index))?;
            println!("{} Removed: {}", "✓".green(), removed.read().name());
            true
        }
        Command::Complete { index } => {
            let task = task_at(&mut manager, index)?;
            task.update(&manager.events().task_status_changed, |t| {
                let complete = t.complete();
                t.set_complete(!complete);
            });
            let task = task.read();
            let state = if task.complete() { "complete" } else { "not complete" };
            println!("{} {} is {}", "✓".green(), task.name(), state);
            true
        }
        Command::Sort => {
            manager.sort()?;
            println!("{} Sorted", "✓".green());
            true
        }
        Command::Show { index } => {
            let task = task_at(&mut manager, index)?;
            let record = task.read().to_record().context("Failed to encode task")?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            false
        }
        Command::Event { actor, event } => {
            let actor = actor.map(PlayerId).unwrap_or(player);
            cmd_event(&manager, &catalog, actor, event)?;
            true
        }
        Command::EndDay { date } => {
            let report = manager.end_of_day(date);
            println!(
                "{} End of day {}: {} renewed, {} reactivated, {} removed",
                "✓".green(),
                date.to_string().cyan(),
                report.renewed,
                report.reactivated,
                report.removed
            );
            true
        }
    };

    if changed {
        manager.save().context("Failed to save tasks")?;
    }
    Ok(())
}

fn task_at(manager: &mut TaskManager, index: usize) -> Result<TaskHandle> {
    let task = manager.tasks()?.get(index).cloned().ok_or(JournalError::NoSuchTask(index))?;
    Ok(task)
}

fn cmd_kinds(registry: &TaskRegistry) {
    for entry in registry.kinds() {
        println!("{}", entry.kind.cyan());
        for param in entry.parameters {
            let mut flags = Vec::new();
            if !param.required {
                flags.push("optional");
            }
            if param.hidden {
                flags.push("hidden");
            }
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            };
            println!("  {} <{}>{}", param.name, param.tag, flags.dimmed());
        }
    }
}

fn cmd_list(manager: &TaskManager, config: &Config, player: PlayerId, all: bool) {
    let owners: Vec<PlayerId> = if all { manager.owners().collect() } else { vec![player] };
    let mut money = 0i64;

    for owner in owners {
        let Some(list) = manager.list(owner).filter(|l| !l.is_empty()) else {
            if !all {
                println!("No tasks");
            }
            continue;
        };
        if all {
            println!("{}", format!("Player {}", owner).bold());
        }
        money = money.saturating_add(print_list(list, config));
    }

    if money != 0 {
        let label = if config.journal.money_view_net_wealth { "Net" } else { "Costs" };
        println!("{}: {}g", label, money);
    }
}

/// Print one list and return its contribution to the money total
fn print_list(list: &TaskList, config: &Config) -> i64 {
    let mut money: i64 = 0;
    for (index, task) in list.iter().enumerate() {
        let task = task.read();
        let marker = if task.complete() && config.journal.enable_visual_task_complete_indicator {
            "✓".green().to_string()
        } else {
            " ".to_string()
        };
        let name = match task.state() {
            TaskState::InProgress => task.name().normal(),
            TaskState::Done => task.name().dimmed(),
            TaskState::Standby => task.name().italic().dimmed(),
        };
        let mut line = format!("{:>3} {} {} {}", index, marker, name, format!("[{}]", task.kind()).dimmed());
        if task.show_progress() {
            line.push_str(&format!(" {}/{}", task.core().count, task.core().max_count));
        }
        if task.core().renew_period.is_renewing() {
            let renewal = format!("({} from {})", task.core().renew_period, task.core().renew_date);
            line.push_str(&format!(" {}", renewal.dimmed()));
        }

        let price = task.price();
        if task.state() == TaskState::InProgress && price != 0 {
            line.push_str(&format!(" {}g", price));
            if price > 0 || config.journal.money_view_net_wealth {
                money = money.saturating_add(price);
            }
        }
        println!("{}", line);
    }
    money
}

fn configure(factory: &mut dyn TaskFactory, params: &[(String, String)]) -> Result<()> {
    for (key, value) in params {
        factory
            .set_raw(key, value)
            .context(format!("Invalid value for '{}'", key))?;
    }
    Ok(())
}

fn cmd_add(
    manager: &mut TaskManager,
    catalog: &dyn Catalog,
    kind: &str,
    name: &str,
    params: &[(String, String)],
    renewal: Option<(Period, WorldDate)>,
) -> Result<()> {
    let mut factory = manager.registry().factory(kind)?;
    configure(factory.as_mut(), params)?;
    let mut task = factory
        .create(name, catalog)
        .ok_or_else(|| eyre!("Parameters for a '{}' task are missing or invalid", kind))?;
    if let Some((period, date)) = renewal {
        task.schedule_renewal(period, date);
    }
    let task = manager.add(task)?;
    let index = manager.tasks()?.position(&task).unwrap_or_default();
    println!("{} Added task {}: {}", "✓".green(), index, task.read().name().cyan());
    Ok(())
}

fn cmd_edit(
    manager: &mut TaskManager,
    catalog: &dyn Catalog,
    index: usize,
    params: &[(String, String)],
    name: Option<&str>,
) -> Result<()> {
    let old = task_at(manager, index)?;
    let old = old.snapshot();

    let mut factory = manager.registry().factory(old.kind())?;
    factory.initialize(old.as_ref())?;
    configure(factory.as_mut(), params)?;
    let name = name.unwrap_or(old.name());
    let mut task = factory
        .create(name, catalog)
        .ok_or_else(|| eyre!("Parameters for a '{}' task are missing or invalid", old.kind()))?;
    task.schedule_renewal(old.core().renew_period, old.core().renew_date);

    manager.tasks()?.set(index, task);
    println!("{} Updated task {}: {}", "✓".green(), index, name.cyan());
    Ok(())
}

fn resolve_item(catalog: &dyn Catalog, id: &str) -> Item {
    if let Some(tool) = id.strip_prefix("(T)") {
        return Item::tool(tool);
    }
    match catalog.item(id) {
        Some(info) => Item::new(id, info.name.clone()).with_category(info.category),
        None => Item::new(id, id),
    }
}

fn cmd_event(manager: &TaskManager, catalog: &dyn Catalog, actor: PlayerId, event: EventCommand) -> Result<()> {
    let events = manager.events();

    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    let subscription = events.task_status_changed.add(move |e: &TaskStatusChanged| {
        if e.completed() {
            sink.lock().push(e.task.read().name().to_string());
        }
    });

    match event {
        EventCommand::Collected { item, count, ingredient } => {
            let mut item = resolve_item(catalog, &item).with_stack(count);
            if let Some(ingredient) = ingredient {
                item = item.with_preserved_parent(ingredient);
            }
            events.item_collected.raise(&ItemReceived { actor, item, count });
        }
        EventCommand::Crafted { item, count } => {
            let item = resolve_item(catalog, &item).with_stack(count);
            events.item_crafted.raise(&ItemReceived { actor, item, count });
        }
        EventCommand::Gifted { npc, item } => {
            let item = resolve_item(catalog, &item);
            events.item_gifted.raise(&ItemGifted { actor, npc, item });
        }
        EventCommand::Purchased { item, amount } => {
            let salable = resolve_item(catalog, &item);
            events.salable_purchased.raise(&SalablePurchased { actor, salable, amount });
        }
        EventCommand::Sold { item, amount } => {
            let salable = resolve_item(catalog, &item);
            events.salable_sold.raise(&SalableSold { actor, salable, amount });
        }
        EventCommand::Built {
            building,
            upgrade,
            cabin,
            location,
        } => {
            let is_upgrade = upgrade.is_some();
            let mut building = if cabin { Building::cabin(building) } else { Building::new(building) };
            if let Some(next) = upgrade {
                building = building.with_next_upgrade(next);
            }
            events.building_constructed.broadcast(
                &BuildingConstructed {
                    actor,
                    location,
                    building,
                    is_upgrade,
                },
                true,
            )?;
        }
        EventCommand::AnimalBought { animal_type } => {
            let args = animal_traded(catalog, actor, animal_type);
            events.farm_animal_purchased.raise(&args);
        }
        EventCommand::AnimalSold { animal_type } => {
            let args = animal_traded(catalog, actor, animal_type);
            events.farm_animal_sold.raise(&args);
        }
        EventCommand::Received { items, upgrading } => {
            let added = items.iter().map(|id| resolve_item(catalog, id)).collect();
            events.inventory_changed.raise(&InventoryChanged {
                actor,
                added,
                tool_being_upgraded: upgrading,
            });
        }
    }

    events.unsubscribe(subscription);
    let completed = std::mem::take(&mut *completed.lock());
    if completed.is_empty() {
        println!("{} Event raised", "✓".green());
    }
    for name in completed {
        println!("{} Completed: {}", "✓".green(), name.cyan());
    }
    Ok(())
}

fn animal_traded(catalog: &dyn Catalog, actor: PlayerId, animal_type: String) -> FarmAnimalTraded {
    let animal = match catalog.animal(&animal_type) {
        Some(info) => FarmAnimal {
            purchase_price: info.price,
            house: info.house.clone(),
        },
        None => FarmAnimal {
            purchase_price: 0,
            house: String::new(),
        },
    };
    FarmAnimalTraded {
        actor,
        animal_type,
        animal,
    }
}
