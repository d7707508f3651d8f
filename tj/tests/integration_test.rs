//! Integration tests for TaskJournal
//!
//! These tests drive the engine the way a host would: factories create tasks,
//! game events advance them, and the manager moves them through the store.

use std::sync::Arc;

use journalstore::{DataStore, FileStore, MemoryStore};
use parking_lot::Mutex;
use serde_json::json;
use taskjournal::catalog::StaticCatalog;
use taskjournal::date::{Period, Season, WorldDate};
use taskjournal::domain::{Building, Item, PlayerId};
use taskjournal::error::JournalError;
use taskjournal::events::{
    BuildingConstructed, InventoryChanged, ItemReceived, PeerHub, SalablePurchased, TaskEvents, TaskStatusChanged,
    WireMessage, names,
};
use taskjournal::factory::TaskRegistry;
use taskjournal::list::TaskList;
use taskjournal::manager::TaskManager;
use taskjournal::persistence::{FORMAT_VERSION, TASKS_DATA_KEY};
use taskjournal::task::{Task, TaskState};
use taskjournal::task::kinds::{BasicTask, BuildTask};
use tempfile::TempDir;

fn manager(store: Arc<dyn DataStore>) -> TaskManager {
    TaskManager::new(Arc::new(TaskEvents::local("taskjournal")), TaskRegistry::builtin(), store)
}

fn collected(actor: i64, id: &str, count: u32) -> ItemReceived {
    ItemReceived {
        actor: PlayerId(actor),
        item: Item::new(id, id),
        count,
    }
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_factory_task_progresses_and_persists() {
    let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
    let catalog = StaticCatalog::builtin().expect("builtin catalog");
    let mut manager = manager(Arc::clone(&store));
    manager.load("Farm_1", PlayerId(1)).expect("load");

    let mut factory = manager.registry().factory("collect").expect("collect factory");
    factory.set_raw("item", "(O)388").expect("item");
    factory.set_raw("count", "10").expect("count");
    let task = factory.create("Gather wood", &catalog).expect("ready");
    let task = manager.add(task).expect("add");
    assert_eq!(task.read().core().owner_id, PlayerId(1));

    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&completed);
    manager.events().task_status_changed.add(move |e: &TaskStatusChanged| {
        if e.completed() {
            sink.lock().push(e.task.read().name().to_string());
        }
    });

    let events = Arc::clone(manager.events());
    events.item_collected.raise(&collected(1, "(O)388", 4));
    events.item_collected.raise(&collected(2, "(O)388", 4));
    events.item_collected.raise(&collected(1, "(O)390", 4));
    assert_eq!(task.read().core().count, 4);

    events.item_collected.raise(&collected(1, "(O)388", 50));
    assert!(task.read().complete());
    assert_eq!(task.read().core().count, 10);
    assert_eq!(*completed.lock(), vec!["Gather wood".to_string()]);

    manager.save().expect("save");

    let mut reloaded = self::manager(store);
    reloaded.load("Farm_1", PlayerId(1)).expect("reload");
    let list = reloaded.tasks().expect("session");
    assert_eq!(list.len(), 1);
    let task = list.get(0).expect("task").snapshot();
    assert_eq!(task.kind(), "collect");
    assert_eq!(task.state(), TaskState::Done);

    let report = reloaded.end_of_day(WorldDate::new(1, Season::Spring, 2));
    assert_eq!(report.removed, 1);
    assert!(reloaded.tasks().expect("session").is_empty());
}

#[test]
fn test_weekly_task_renews_on_its_weekday() {
    let mut manager = manager(Arc::new(MemoryStore::new()));
    manager.load("Farm_1", PlayerId(1)).expect("load");

    let mut chores = BasicTask::new("Pet the dog");
    chores.schedule_renewal(Period::Weekly, WorldDate::new(1, Season::Spring, 1));
    let task = manager.add(Box::new(chores)).expect("add");
    task.write().mark_as_completed();

    let report = manager.end_of_day(WorldDate::new(1, Season::Spring, 3));
    assert_eq!(report.renewed, 1);
    assert_eq!(report.reactivated, 0);
    assert_eq!(task.read().state(), TaskState::Standby);

    // Spring 7 is the eve of the next Monday
    let report = manager.end_of_day(WorldDate::new(1, Season::Spring, 7));
    assert_eq!(report.reactivated, 1);
    assert_eq!(task.read().state(), TaskState::InProgress);
    assert_eq!(manager.tasks().expect("session").len(), 1);
}

#[test]
fn test_tool_upgrade_round_trip() {
    let catalog = StaticCatalog::builtin().expect("builtin catalog");
    let mut manager = manager(Arc::new(MemoryStore::new()));
    manager.load("Farm_1", PlayerId(1)).expect("load");

    let mut factory = manager.registry().factory("blacksmith").expect("factory");
    factory.set_raw("tool", "Axe").expect("tool");
    let task = manager
        .add(factory.create("Upgrade axe", &catalog).expect("ready"))
        .expect("add");
    let fee = task.read().price();
    assert!(fee > 0);

    let events = Arc::clone(manager.events());
    events.salable_purchased.raise(&SalablePurchased {
        actor: PlayerId(1),
        salable: Item::tool("Axe"),
        amount: 1,
    });
    assert_eq!(task.read().core().count, 1);
    assert_eq!(task.read().price(), 0);

    events.inventory_changed.raise(&InventoryChanged {
        actor: PlayerId(1),
        added: vec![Item::tool("Axe")],
        tool_being_upgraded: Some("Axe".to_string()),
    });
    assert!(!task.read().complete());

    events.inventory_changed.raise(&InventoryChanged {
        actor: PlayerId(1),
        added: vec![Item::tool("Axe")],
        tool_being_upgraded: None,
    });
    assert!(task.read().complete());
}

#[test]
fn test_edit_rebuilds_task_in_place() {
    let catalog = StaticCatalog::builtin().expect("builtin catalog");
    let mut manager = manager(Arc::new(MemoryStore::new()));
    manager.load("Farm_1", PlayerId(1)).expect("load");

    let mut factory = manager.registry().factory("buy").expect("factory");
    factory.set_raw("item", "(O)472").expect("item");
    factory.set_raw("count", "5").expect("count");
    let original = manager.add(factory.create("Seeds", &catalog).expect("ready")).expect("add");
    assert_eq!(original.read().price(), 100);

    let snapshot = original.snapshot();
    let mut editor = manager.registry().factory(snapshot.kind()).expect("factory");
    editor.initialize(snapshot.as_ref()).expect("initialize");
    editor.set_raw("count", "8").expect("count");
    let edited = editor.create(snapshot.name(), &catalog).expect("ready");

    let list = manager.tasks().expect("session");
    let old = list.set(0, edited).expect("replaced");
    assert!(old.ptr_eq(&original));
    assert_eq!(list.get(0).expect("task").read().price(), 160);
    assert_eq!(manager.events().salable_purchased.listener_count(), 1);
}

// =============================================================================
// Shared Session Tests
// =============================================================================

#[test]
fn test_building_broadcast_reaches_farmhand() {
    let hub = PeerHub::new();
    let (host_transport, mut host_inbox) = hub.join();
    let (farmhand_transport, mut farmhand_inbox) = hub.join();
    let host = Arc::new(TaskEvents::new("taskjournal", Arc::new(host_transport)));
    let farmhand = Arc::new(TaskEvents::new("taskjournal", Arc::new(farmhand_transport)));

    let mut host_list = TaskList::new(PlayerId(1), Arc::clone(&host));
    let mut farmhand_list = TaskList::new(PlayerId(2), Arc::clone(&farmhand));
    let host_shed = host_list.add(Box::new(BuildTask::new("Shed", "Shed", 1, 15000)) as Box<dyn Task>);
    let farmhand_shed = farmhand_list.add(Box::new(BuildTask::new("Shed", "Shed", 1, 15000)) as Box<dyn Task>);

    // Construction only completes on the host; the farmhand learns of it by broadcast
    host.building_constructed
        .broadcast(
            &BuildingConstructed {
                actor: PlayerId(2),
                location: "Farm".to_string(),
                building: Building::new("Shed"),
                is_upgrade: false,
            },
            true,
        )
        .expect("broadcast");
    assert!(!host_shed.read().complete());
    assert!(!farmhand_shed.read().complete());

    assert_eq!(farmhand.pump(&mut farmhand_inbox), 1);
    assert_eq!(host.pump(&mut host_inbox), 0);
    assert!(farmhand_shed.read().complete());
    assert!(!host_shed.read().complete());
}

#[test]
fn test_inbound_messages_filtered() {
    let hub = PeerHub::new();
    let (transport, _inbox) = hub.join();
    let events = TaskEvents::new("taskjournal", Arc::new(transport));

    let foreign = WireMessage {
        channel_name: names::BUILDING_CONSTRUCTED.to_string(),
        sender_mod_id: "othermod".to_string(),
        payload: json!({}),
    };
    assert!(!events.try_receive(foreign).expect("foreign messages are ignored"));

    let unknown = WireMessage {
        channel_name: "weather-changed".to_string(),
        sender_mod_id: "taskjournal".to_string(),
        payload: json!({}),
    };
    assert!(events.try_receive(unknown).is_err());

    let garbled = WireMessage {
        channel_name: names::BUILDING_CONSTRUCTED.to_string(),
        sender_mod_id: "taskjournal".to_string(),
        payload: json!({ "playerId": "nope" }),
    };
    assert!(events.try_receive(garbled.clone()).is_err());
    events.receive(garbled);
}

// =============================================================================
// Storage Tests
// =============================================================================

#[test]
fn test_legacy_file_is_migrated_on_save() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::open(temp_dir.path()).expect("open store"));
    store
        .write(
            TASKS_DATA_KEY,
            &json!({
                "tasks": {
                    "Farm_1": [
                        { "kind": "basic", "name": "Water crops" },
                        { "kind": "header", "name": "Spring" }
                    ],
                    "Farm_2": [
                        { "kind": "basic", "name": "Other farm" }
                    ]
                }
            }),
        )
        .expect("seed");

    let mut manager = manager(store.clone());
    manager.load("Farm_1", PlayerId(7)).expect("load");
    {
        let list = manager.tasks().expect("session");
        assert_eq!(list.owner(), PlayerId(7));
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|t| t.read().core().owner_id == PlayerId(7)));
    }
    assert!(manager.list(PlayerId::LEGACY).is_none());
    manager.save().expect("save");

    let stored = store.read(TASKS_DATA_KEY).expect("read").expect("record");
    assert_eq!(stored["version"], FORMAT_VERSION);
    assert_eq!(stored["tasks"]["Farm_1"]["7"].as_array().map(Vec::len), Some(2));
    assert!(stored["tasks"]["Farm_1"].get("0").is_none());
    assert_eq!(stored["tasks"]["Farm_2"]["0"][0]["name"], "Other farm");
}

#[test]
fn test_corrupt_record_leaves_nothing_loaded() {
    let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
    store
        .write(
            TASKS_DATA_KEY,
            &json!({ "tasks": { "Farm_1": { "1": [ { "kind": "fish", "name": "Catch a carp" } ] } } }),
        )
        .expect("seed");

    let mut manager = manager(store);
    let err = manager.load("Farm_1", PlayerId(1)).unwrap_err();
    assert!(matches!(err, JournalError::Decode(_)));
    assert!(manager.session().is_none());
    assert!(matches!(manager.tasks(), Err(JournalError::NoSession)));
    assert!(matches!(manager.save(), Err(JournalError::NoSession)));
}
