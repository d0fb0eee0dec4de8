use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use engine::{
    AudioSink, FrameTime, InputSnapshot, KeyValueStore, MemoryAssetLoader, MemoryStore,
    RecordingAudio, StorageError, Vec2,
};
use serde_json::{json, Value};

use super::entities::{Direction, Puff};
use super::thing::{Thing, ThingIdAllocator, ThingKind, ThingType};
use super::*;
use crate::app::config::GameConfig;
use crate::app::hud::{ItemIcons, TextBoxOwner};

const VIEWPORT: (u32, u32) = (2000, 720);

/// Store handle the test keeps while the game owns a clone.
#[derive(Debug, Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl SharedStore {
    fn writes(&self) -> usize {
        self.0.borrow().writes()
    }

    fn saved(&self) -> Option<Value> {
        let text = self.0.borrow().get(GameConfig::default().save_key.as_str()).ok()??;
        serde_json::from_str(&text).ok()
    }
}

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.0.borrow_mut().remove(key)
    }
}

/// Audio handle the test keeps while the game owns a clone.
#[derive(Debug, Clone, Default)]
struct SharedAudio(Rc<RefCell<RecordingAudio>>);

impl SharedAudio {
    fn last_mix_value(&self, param: &str) -> Option<f32> {
        self.0.borrow().last_mix_value(param)
    }
}

impl AudioSink for SharedAudio {
    fn play_sfx(&mut self, name: &str, pitch_shift: f32) {
        self.0.borrow_mut().play_sfx(name, pitch_shift);
    }

    fn set_mix_param(&mut self, param: &str, value: f32, fade: Duration) {
        self.0.borrow_mut().set_mix_param(param, value, fade);
    }
}

fn hall(player_inventory: Value, extra: Vec<Value>) -> Value {
    let mut things = vec![
        json!({"@type": "Player", "x": 1000, "y": 600, "inventory": player_inventory}),
        json!({"@type": "Door", "name": "to-greenhouse", "x": 300, "width": 120, "base": 600, "height": 300, "target": ["greenhouse", "to-hall"]}),
        json!({"@type": "Door", "name": "hatch", "x": 1000, "width": 150, "base": 120, "height": 80, "target": ["attic", "hatch"], "direction": "up"}),
        json!({"@type": "Door", "name": "stairs", "x": 1800, "width": 120, "base": 600, "height": 300, "target": ["cellar", "stairs"]}),
        json!({"@type": "AnimatedObject", "x": 925, "y": 40, "frames": ["hall/hatch-0.png", "hall/hatch-1.png"], "frameRate": 8, "visible": true, "animating": false, "looping": false}),
    ];
    things.extend(extra);
    json!({
        "@type": "Hall",
        "name": "hall",
        "width": 2000,
        "height": 720,
        "vanishingPoint": {"x": 1000, "y": 300},
        "floorHeight": 600,
        "background": ["rooms/hall.png"],
        "things": things,
    })
}

fn greenhouse() -> Value {
    json!({
        "@type": "Room",
        "name": "greenhouse",
        "width": 2000,
        "height": 720,
        "vanishingPoint": {"x": 1000, "y": 300},
        "floorHeight": 600,
        "background": ["rooms/greenhouse-0.png", "rooms/greenhouse-1.png"],
        "things": [
            {"@type": "Door", "name": "to-hall", "x": 1700, "width": 120, "base": 600, "height": 300, "target": ["hall", "to-greenhouse"]},
            {"@type": "ResourceSpawner", "x": 900, "y": 450, "resourceType": "morning-dew"},
        ],
    })
}

fn attic() -> Value {
    json!({
        "@type": "Room",
        "name": "attic",
        "width": 1200,
        "height": 720,
        "vanishingPoint": {"x": 600, "y": 300},
        "floorHeight": 600,
        "things": [
            {"@type": "Door", "name": "hatch", "x": 600, "width": 150, "base": 600, "height": 80, "target": ["hall", "hatch"], "direction": "down"},
        ],
    })
}

fn cellar() -> Value {
    json!({
        "@type": "Room",
        "name": "cellar",
        "width": 1600,
        "height": 720,
        "vanishingPoint": {"x": 800, "y": 300},
        "floorHeight": 600,
        "interacts": ["loud"],
        "things": [
            {"@type": "Door", "name": "stairs", "x": 200, "width": 120, "base": 600, "height": 300, "target": ["hall", "stairs"]},
        ],
    })
}

fn world(player_inventory: Value, extra: Vec<Value>) -> Value {
    json!({
        "rooms": [hall(player_inventory, extra), greenhouse(), attic(), cellar()],
        "currentProgressLevel": 0,
    })
}

fn load_with(data: Value, config: &GameConfig) -> (Game, SharedStore) {
    let store = SharedStore::default();
    let deps = GameDeps {
        registry: Registry::with_builtin().expect("registry"),
        progress: Progress::standard(),
        audio: Box::new(RecordingAudio::default()),
        store: Box::new(store.clone()),
        icons: ItemIcons::new(),
    };
    let mut assets = MemoryAssetLoader::new();
    let game = Game::from_data(data, deps, &mut assets, config).expect("game loads");
    (game, store)
}

fn load(data: Value) -> (Game, SharedStore) {
    load_with(data, &GameConfig::default())
}

fn load_listening(data: Value) -> (Game, SharedStore, SharedAudio) {
    let store = SharedStore::default();
    let audio = SharedAudio::default();
    let deps = GameDeps {
        registry: Registry::with_builtin().expect("registry"),
        progress: Progress::standard(),
        audio: Box::new(audio.clone()),
        store: Box::new(store.clone()),
        icons: ItemIcons::new(),
    };
    let mut assets = MemoryAssetLoader::new();
    let game = Game::from_data(data, deps, &mut assets, &GameConfig::default())
        .expect("game loads");
    (game, store, audio)
}

fn cabinet() -> Value {
    json!({"@type": "Cabinet", "x": 1100, "y": 300,
        "topItem": {"@type": "ResourceSpawner", "x": 0, "y": 0, "resourceType": "feather"},
        "bottomItem": {"@type": "ResourceSpawner", "x": 0, "y": 0, "resourceType": "gunpowder"}})
}

fn idle() -> InputSnapshot {
    InputSnapshot::empty().with_viewport(VIEWPORT.0, VIEWPORT.1)
}

fn pressed_at(point: Vec2) -> InputSnapshot {
    idle().with_pointer(point.x, point.y, true)
}

fn frame(now: f64, dt: f32) -> FrameTime {
    FrameTime { now, dt }
}

/// Press then release at `point`, one frame each.
fn click(game: &mut Game, now: &mut f64, point: Vec2) {
    *now += 0.016;
    game.tick(frame(*now, 0.016), &pressed_at(point)).expect("press");
    *now += 0.016;
    game.tick(frame(*now, 0.016), &idle().with_pointer(point.x, point.y, false))
        .expect("release");
}

fn held(game: &Game) -> Vec<ItemRef> {
    game.player().expect("player").inventory().items()
}

fn coin() -> ItemRef {
    ItemRef::Material(MaterialType::Coin)
}

#[test]
fn round_trip_reproduces_serialized_output() {
    let (game, _) = load(world(
        json!({"materials": ["coin", "feather"], "puzzleObjects": ["key"]}),
        vec![
            json!({"@type": "Cauldron", "x": 1200, "y": 550, "width": 120, "height": 100}),
            json!({"@type": "Furnace", "x": 1500, "y": 500, "width": 140, "height": 160}),
            json!({"@type": "Npc", "x": 600, "y": 400, "width": 80, "height": 120, "npcType": "CAT"}),
            json!({"@type": "Container", "x": 1300, "y": 300, "width": 100, "height": 100, "items": [
                {"@type": "ResourceSpawner", "x": 1350, "y": 420, "resourceType": "gunpowder"}
            ]}),
            json!({"@type": "PuzzleObjectSpawner", "x": 700, "y": 500, "puzzleObjectType": "big-key"}),
        ],
    ));
    let first = game.get_state().expect("first state");
    let (reloaded, _) = load(first.clone());
    let second = reloaded.get_state().expect("second state");
    assert_eq!(first, second);
}

#[test]
fn save_load_identity_for_two_rooms() {
    let data = json!({
        "rooms": [
            hall(json!({"materials": ["coin", "feather"], "puzzleObjects": ["key"]}), vec![]),
            greenhouse(),
        ],
        "currentProgressLevel": 0,
    });
    let (game, _) = load(data);
    let state = game.get_state().expect("state");

    let (reloaded, _) = load(state.clone());
    assert_eq!(reloaded.get_state().expect("reloaded state"), state);
    assert_eq!(reloaded.rooms().len(), 2);
    let expected = vec![
        coin(),
        ItemRef::Material(MaterialType::Feather),
        ItemRef::PuzzleObject(PuzzleObjectType::Key),
    ];
    assert_eq!(held(&reloaded), expected);
    assert_eq!(reloaded.hud().hotbar().items(), expected.as_slice());
}

#[test]
fn things_stay_sorted_by_z_with_stable_ties() {
    let (mut game, _) = load(world(
        json!({}),
        vec![
            json!({"@type": "Npc", "x": 600, "y": 400, "width": 80, "height": 120, "npcType": "CAT"}),
            json!({"@type": "Npc", "x": 600, "y": 400, "width": 80, "height": 120, "npcType": "GHOST"}),
            json!({"@type": "Cauldron", "x": 1200, "y": 550, "width": 120, "height": 100}),
        ],
    ));
    let puff = Thing::new(ThingIdAllocator::default().allocate(), Puff::new(1.0, 1.0));
    game.room_mut().adopt_thing(puff);

    let zs: Vec<f32> = game.room().things().iter().map(Thing::z).collect();
    assert!(zs.windows(2).all(|pair| pair[0] <= pair[1]), "z order {zs:?}");
    assert!(matches!(
        game.room().things().last().map(Thing::kind),
        Some(ThingKind::Puff(_))
    ));

    let npcs: Vec<_> = game.room().objects_of_type(ThingType::Npc).collect();
    assert!(matches!(npcs[0].kind(), ThingKind::Npc(npc) if npc.npc_type() == NpcType::Cat));
    assert!(matches!(npcs[1].kind(), ThingKind::Npc(npc) if npc.npc_type() == NpcType::Ghost));
}

#[test]
fn later_adopted_thing_wins_the_click() {
    let (mut game, _) = load(world(
        json!({}),
        vec![
            json!({"@type": "Npc", "x": 600, "y": 400, "width": 80, "height": 120, "npcType": "CAT"}),
            json!({"@type": "Npc", "x": 600, "y": 400, "width": 80, "height": 120, "npcType": "GHOST"}),
        ],
    ));
    let ghost = game
        .room()
        .objects_of_type(ThingType::Npc)
        .last()
        .map(Thing::id)
        .expect("ghost");

    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(640.0, 450.0));

    assert_eq!(game.hud().text_box().owner(), Some(TextBoxOwner::Thing(ghost)));
    let expected = game.progress().get_dialog(NpcType::Ghost).unwrap_or("...");
    assert_eq!(game.hud().text_box().text(), Some(expected));
}

#[test]
fn unclaimed_click_walks_the_player() {
    let (mut game, _) = load(world(json!({}), vec![]));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1300.0, 650.0));
    assert_eq!(game.player().expect("player").target_x(), 1300.0);
}

#[test]
fn full_inventory_rejects_take_without_changes() {
    let config = GameConfig {
        inventory_size: 3,
        ..GameConfig::default()
    };
    let (mut game, _) = load_with(
        world(
            json!({"materials": ["coin", "feather"], "puzzleObjects": ["key"]}),
            vec![json!({"@type": "ResourceSpawner", "x": 1200, "y": 450, "resourceType": "hushroom", "unlocks": "recovered-hushroom"})],
        ),
        &config,
    );
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1200.0, 450.0));
    let take = game.hud().take_button_centre().expect("item window open");
    click(&mut game, &mut now, take);

    assert_eq!(held(&game).len(), 3);
    assert_eq!(game.hud().hotbar().items().len(), 3);
    assert_eq!(game.hud().toast_message(), Some("Your pockets are full!"));
    assert_eq!(game.progress().level(), 0);
}

#[test]
fn taking_a_spawned_material_unlocks_and_saves() {
    let (mut game, store) = load(world(
        json!({}),
        vec![json!({"@type": "ResourceSpawner", "x": 1200, "y": 450, "resourceType": "hushroom", "unlocks": "recovered-hushroom"})],
    ));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1200.0, 450.0));
    assert_eq!(
        game.hud().item_window().item(),
        Some(ItemRef::Material(MaterialType::Hushroom))
    );
    let take = game.hud().take_button_centre().expect("item window open");
    click(&mut game, &mut now, take);

    assert_eq!(held(&game), vec![ItemRef::Material(MaterialType::Hushroom)]);
    assert_eq!(game.progress().level_name(), "recovered-hushroom");
    assert!(game.progress().is_room_unlocked("cellar"));
    let saved = store.saved().expect("save written");
    assert_eq!(saved["currentProgressLevel"], json!(1));
}

#[test]
fn duplicate_material_is_rejected() {
    let (mut game, _) = load(world(
        json!({"materials": ["coin"]}),
        vec![json!({"@type": "ResourceSpawner", "x": 1200, "y": 450, "resourceType": "coin"})],
    ));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1200.0, 450.0));
    let take = game.hud().take_button_centre().expect("item window open");
    click(&mut game, &mut now, take);

    assert_eq!(held(&game), vec![coin()]);
    assert_eq!(game.hud().toast_message(), Some("You already have Coins"));
}

#[test]
fn progress_never_moves_backwards() {
    let (mut game, _) = load(world(json!({}), vec![]));
    assert!(game.progress_mut().increase_progress_level(2).expect("to 2"));
    assert!(!game.progress_mut().increase_progress_level(1).expect("to 1"));
    assert_eq!(game.progress().level(), 2);
}

#[test]
fn room_change_is_deferred_to_the_end_of_the_tick() {
    let (mut game, _) = load(world(json!({}), vec![]));
    game.go_to_door("greenhouse", "to-hall", Direction::Left)
        .expect("request");
    assert_eq!(game.room().name(), "hall");
    assert!(game.has_pending_transition());

    game.tick(frame(1.0, 0.016), &idle()).expect("tick");
    assert_eq!(game.room().name(), "greenhouse");
    assert!(!game.has_pending_transition());
    assert!(game.is_transitioning());
    let player = game.player().expect("player moved");
    assert_eq!(player.target_x(), 1700.0);
    assert!(game.room_named("hall").expect("hall").player().is_none());

    game.tick(frame(1.2, 0.016), &idle()).expect("mid transition");
    assert!(game.is_transitioning());
    game.tick(frame(1.6, 0.016), &idle()).expect("after transition");
    assert!(!game.is_transitioning());
}

#[test]
fn clicking_a_reachable_door_changes_room_after_tick() {
    let (mut game, _) = load(world(json!({}), vec![]));
    let mut now = 0.0;
    // Walk close enough first.
    click(&mut game, &mut now, Vec2::new(400.0, 650.0));
    for _ in 0..200 {
        now += 0.016;
        game.tick(frame(now, 0.016), &idle()).expect("walk");
    }
    click(&mut game, &mut now, Vec2::new(300.0, 500.0));
    assert_eq!(game.room().name(), "greenhouse");
}

#[test]
fn locked_attic_replays_the_hatch_and_stays_put() {
    let (mut game, _) = load(world(json!({}), vec![]));
    game.go_to_door("attic", "hatch", Direction::Up).expect("locked");

    assert_eq!(game.room().name(), "hall");
    assert!(!game.has_pending_transition());
    assert!(game.room().hatch().expect("hatch").is_animating());
    assert_eq!(game.hud().text_box().text(), Some("< angry ghost noises >"));
}

#[test]
fn locked_plain_door_toasts() {
    let (mut game, _) = load(world(json!({}), vec![]));
    game.go_to_door("cellar", "stairs", Direction::Right)
        .expect("locked");
    assert_eq!(game.room().name(), "hall");
    assert_eq!(game.hud().toast_message(), Some("Locked"));
}

#[test]
fn fixed_radio_opens_the_attic() {
    let (mut game, _) = load(world(json!({"puzzleObjects": ["fixed-radio"]}), vec![]));
    game.progress_mut()
        .set_progress_level(1)
        .expect("recovered hushroom");
    game.go_to_door("attic", "hatch", Direction::Up).expect("hand over");

    assert!(held(&game).is_empty());
    assert_eq!(game.progress().level_name(), "returned-radio");
    assert!(game.progress().is_room_unlocked("attic"));
    assert_eq!(
        game.hud().text_box().text(),
        Some("You fixed my radio! Thanks a bundle! Come on up!")
    );
}

#[test]
fn hall_gives_a_broken_radio_when_the_ghost_finishes() {
    let (mut game, _) = load(world(json!({}), vec![]));
    game.progress_mut()
        .set_progress_level(1)
        .expect("recovered hushroom");
    game.go_to_door("attic", "hatch", Direction::Up).expect("angry ghost");

    game.tick(frame(1.0, 3.0), &idle()).expect("reveal");
    game.tick(frame(4.0, 3.0), &idle()).expect("close");

    assert!(game.hud().text_box().owner().is_none());
    assert_eq!(
        held(&game),
        vec![ItemRef::PuzzleObject(PuzzleObjectType::BrokenRadio)]
    );
}

#[test]
fn loud_room_wilts_a_held_hushroom() {
    let (mut game, _) = load(world(json!({"materials": ["hushroom", "coin"]}), vec![]));
    game.progress_mut()
        .set_progress_level(1)
        .expect("cellar unlocked");
    game.go_to_door("cellar", "stairs", Direction::Right)
        .expect("request");
    game.tick(frame(1.0, 0.016), &idle()).expect("enter cellar");

    assert_eq!(game.room().name(), "cellar");
    assert_eq!(held(&game), vec![coin()]);
    assert_eq!(game.hud().hotbar().items(), &[coin()]);
}

#[test]
fn container_spills_its_items_once() {
    let (mut game, store) = load(world(
        json!({}),
        vec![json!({"@type": "Container", "x": 1100, "y": 300, "width": 100, "height": 100, "items": [
            {"@type": "ResourceSpawner", "x": 1150, "y": 460, "resourceType": "gunpowder"}
        ]})],
    ));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1150.0, 350.0));

    assert_eq!(game.room().objects_of_type(ThingType::Container).count(), 0);
    assert_eq!(game.room().objects_of_type(ThingType::ResourceSpawner).count(), 1);
    let saved = store.saved().expect("saved after opening");
    let hall = &saved["rooms"][0]["things"];
    let tags: Vec<&str> = hall
        .as_array()
        .expect("things")
        .iter()
        .filter_map(|thing| thing["@type"].as_str())
        .collect();
    assert!(tags.contains(&"ResourceSpawner"));
    assert!(!tags.contains(&"Container"));
}

#[test]
fn hotbar_material_goes_into_a_nearby_cauldron() {
    let (mut game, _) = load(world(
        json!({"materials": ["coin"]}),
        vec![json!({"@type": "Cauldron", "x": 1100, "y": 550, "width": 120, "height": 100})],
    ));
    let mut now = 0.0;
    game.tick(frame(now, 0.016), &idle()).expect("viewport");
    let slot = game.hud().slot_centre(0);
    click(&mut game, &mut now, slot);

    assert!(held(&game).is_empty());
    let cauldron = game
        .room()
        .objects_of_type(ThingType::Cauldron)
        .next()
        .expect("cauldron");
    assert!(matches!(cauldron.kind(), ThingKind::Cauldron(c) if c.brewing().len() == 1));
}

#[test]
fn potion_with_nothing_to_apply_toasts() {
    let (mut game, _) = load(world(json!({"potions": ["energy"]}), vec![]));
    let mut now = 0.0;
    game.tick(frame(now, 0.016), &idle()).expect("viewport");
    let slot = game.hud().slot_centre(0);
    click(&mut game, &mut now, slot);

    assert_eq!(held(&game), vec![ItemRef::Potion(PotionType::Energy)]);
    assert_eq!(game.hud().toast_message(), Some("Nothing to apply that to"));
}

#[test]
fn wood_potion_is_refused_when_firewood_is_held() {
    let (mut game, _) = load(world(
        json!({"materials": ["coin", "firewood"], "potions": ["temp-transmutation-wood"]}),
        vec![],
    ));
    let mut now = 0.0;
    game.tick(frame(now, 0.016), &idle()).expect("viewport");
    let before = held(&game);
    let slot = game.hud().slot_centre(2);
    click(&mut game, &mut now, slot);

    assert_eq!(held(&game), before);
    assert_eq!(game.hud().hotbar().items(), before.as_slice());
    assert_eq!(game.hud().toast_message(), Some("You already have Firewood"));
}

#[test]
fn out_of_range_saved_level_starts_at_the_first_level() {
    let mut data = world(json!({}), vec![]);
    data["currentProgressLevel"] = json!(99);
    let (game, _) = load(data);
    assert_eq!(game.progress().level(), 0);
}

#[test]
fn small_key_opens_the_bottom_drawer() {
    let (mut game, store) = load(world(json!({"puzzleObjects": ["small-key"]}), vec![cabinet()]));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1090.0, 320.0));

    assert_eq!(game.progress().level_name(), "opened-bottom-drawer");
    let spawners: Vec<MaterialType> = game
        .room()
        .things()
        .iter()
        .filter_map(|thing| match thing.kind() {
            ThingKind::ResourceSpawner(spawner) => Some(spawner.material()),
            _ => None,
        })
        .collect();
    assert_eq!(spawners, vec![MaterialType::Gunpowder]);
    let saved = store.saved().expect("saved after opening");
    let things = saved["rooms"][0]["things"].as_array().expect("things");
    let cabinet = things
        .iter()
        .find(|thing| thing["@type"] == json!("Cabinet"))
        .expect("cabinet saved");
    assert_eq!(cabinet["bottomItem"], Value::Null);
    assert_eq!(cabinet["topItem"]["resourceType"], json!("feather"));
}

#[test]
fn plain_key_is_too_big_for_the_cabinet() {
    let (mut game, _) = load(world(json!({"puzzleObjects": ["key"]}), vec![cabinet()]));
    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1090.0, 320.0));

    assert_eq!(game.hud().toast_message(), Some("This key is too big!"));
    assert_eq!(game.progress().level(), 0);
}

#[test]
fn flag_switch_remixes_and_is_saved() {
    let switch = json!({"@type": "FlagSwitcher", "x": 1300, "y": 300, "width": 100, "height": 60,
        "flagsToToggle": ["plants-asleep"]});
    let (mut game, store, audio) = load_listening(world(json!({}), vec![switch]));
    assert_eq!(audio.last_mix_value("plant_gain"), Some(1.0));

    let mut now = 0.0;
    click(&mut game, &mut now, Vec2::new(1300.0, 300.0));

    assert!(game.flags().value("plants-asleep"));
    assert_eq!(audio.last_mix_value("plant_gain"), Some(0.0));
    let saved = store.saved().expect("saved after switching");
    assert_eq!(saved["flags"], json!([{"name": "plants-asleep", "value": true}]));

    let (reloaded, _, reloaded_audio) = load_listening(saved);
    assert!(reloaded.flags().value("plants-asleep"));
    assert_eq!(reloaded_audio.last_mix_value("plant_gain"), Some(0.0));
}

#[test]
fn save_is_written_once_at_end_of_tick() {
    let (mut game, store) = load(world(json!({}), vec![]));
    game.save();
    game.save();
    assert!(game.save_requested());
    assert_eq!(store.writes(), 0);

    game.tick(frame(1.0, 0.016), &idle()).expect("tick");
    assert!(!game.save_requested());
    assert_eq!(store.writes(), 1);
    assert!(store.saved().is_some());
}

#[test]
fn missing_destination_door_is_fatal() {
    let (mut game, _) = load(world(json!({}), vec![]));
    game.go_to_door("greenhouse", "back-door", Direction::Left)
        .expect("request accepted");
    let err = game
        .tick(frame(1.0, 0.016), &idle())
        .expect_err("no such door");
    assert!(matches!(err, GameError::DoorNotFound { .. }));
    assert!(!game.has_pending_transition());
}

#[test]
fn world_without_player_has_no_starting_room() {
    let deps = GameDeps {
        registry: Registry::with_builtin().expect("registry"),
        progress: Progress::standard(),
        audio: Box::new(RecordingAudio::default()),
        store: Box::new(SharedStore::default()),
        icons: ItemIcons::new(),
    };
    let data = json!({"rooms": [greenhouse()]});
    let err = Game::from_data(
        data,
        deps,
        &mut MemoryAssetLoader::new(),
        &GameConfig::default(),
    )
    .err()
    .expect("no player");
    assert!(matches!(err, GameError::NoStartingRoom));
}

#[test]
fn shipped_world_loads_in_the_hall() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/world.json");
    let text = std::fs::read_to_string(path).expect("shipped world");
    let data: Value = serde_json::from_str(&text).expect("world json");
    let (game, _) = load(data);

    assert_eq!(game.room().name(), "hall");
    assert_eq!(game.rooms().len(), 4);
    assert!(game.room().hatch().is_some());
    assert!(game.room_named("cellar").expect("cellar").interacts().contains(&"loud".to_string()));
    let has = |room: &str, kind: ThingType| {
        game.room_named(room)
            .expect("room")
            .things()
            .iter()
            .any(|thing| thing.kind().thing_type() == kind)
    };
    assert!(has("attic", ThingType::Cabinet));
    assert!(has("greenhouse", ThingType::Plants));
    assert!(has("greenhouse", ThingType::FlagSwitcher));
}
