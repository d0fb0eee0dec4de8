//! Type-tag dispatch for saving and loading things and rooms.

use std::collections::BTreeMap;
use std::fmt;

use engine::{AssetError, AssetLoader};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::entities::{
    AnimatedObject, Cabinet, Cauldron, Container, Door, FlagSwitcher, Furnace, Npc, Plants,
    PuzzleObjectSpawner, ResourceSpawner,
};
use super::player::Player;
use super::room::{Room, RoomKind, RoomRecord};
use super::thing::{RoomId, Thing, ThingIdAllocator, ThingKind, ThingType};

pub(crate) const TYPE_KEY: &str = "@type";

#[derive(Debug, Error)]
pub(crate) enum RegistryError {
    #[error("type tag {0:?} is already registered")]
    DuplicateType(String),
    #[error("no factory registered for type tag {0:?}")]
    UnregisteredType(String),
    #[error("record has no string \"@type\" field")]
    MissingTypeTag,
    #[error("{0:?} things are not serializable")]
    NotSerializable(ThingType),
    #[error("invalid {tag} record at {path}: {source}")]
    InvalidRecord {
        tag: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {tag} record: {source}")]
    Encode {
        tag: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to load assets for {tag}: {source}")]
    Asset {
        tag: &'static str,
        #[source]
        source: AssetError,
    },
    #[error("invalid {tag}: {message}")]
    Content { tag: &'static str, message: String },
}

/// Out-of-band state a factory may need besides its record.
pub(crate) struct LoadContext<'a> {
    pub(crate) assets: &'a mut dyn AssetLoader,
    pub(crate) ids: &'a mut ThingIdAllocator,
    pub(crate) registry: &'a Registry,
    pub(crate) room: Option<RoomId>,
}

impl LoadContext<'_> {
    pub(crate) fn asset_error(tag: &'static str) -> impl FnOnce(AssetError) -> RegistryError {
        move |source| RegistryError::Asset { tag, source }
    }
}

/// A thing type that round-trips through a tagged JSON record.
pub(crate) trait Persisted: Sized + Into<ThingKind> {
    const TAG: &'static str;
    type Record: Serialize + DeserializeOwned;

    fn from_record(record: Self::Record, ctx: &mut LoadContext<'_>) -> Result<Self, RegistryError>;
    fn to_record(&self, registry: &Registry) -> Result<Self::Record, RegistryError>;
}

pub(crate) type ThingFactory =
    fn(Value, &mut LoadContext<'_>) -> Result<ThingKind, RegistryError>;
pub(crate) type RoomFactory = fn(RoomRecord, &mut LoadContext<'_>) -> Result<Room, RegistryError>;

/// Tag → factory tables, built once at startup and read-only afterwards.
#[derive(Default)]
pub(crate) struct Registry {
    things: BTreeMap<String, ThingFactory>,
    rooms: BTreeMap<String, RoomFactory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("things", &self.things.keys().collect::<Vec<_>>())
            .field("rooms", &self.rooms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_builtin() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register::<Player>()?;
        registry.register::<Door>()?;
        registry.register::<ResourceSpawner>()?;
        registry.register::<PuzzleObjectSpawner>()?;
        registry.register::<Container>()?;
        registry.register::<Cabinet>()?;
        registry.register::<Cauldron>()?;
        registry.register::<Furnace>()?;
        registry.register::<AnimatedObject>()?;
        registry.register::<Npc>()?;
        registry.register::<Plants>()?;
        registry.register::<FlagSwitcher>()?;
        registry.register_room(RoomKind::PLAIN_TAG, Room::load_plain)?;
        registry.register_room(RoomKind::HALL_TAG, Room::load_hall)?;
        Ok(registry)
    }

    pub(crate) fn register<T: Persisted>(&mut self) -> Result<(), RegistryError> {
        self.register_thing(T::TAG, load_thing::<T>)
    }

    pub(crate) fn register_thing(
        &mut self,
        tag: &str,
        factory: ThingFactory,
    ) -> Result<(), RegistryError> {
        if self.things.contains_key(tag) {
            return Err(RegistryError::DuplicateType(tag.to_string()));
        }
        self.things.insert(tag.to_string(), factory);
        debug!(tag, "thing_type_registered");
        Ok(())
    }

    pub(crate) fn register_room(
        &mut self,
        tag: &str,
        factory: RoomFactory,
    ) -> Result<(), RegistryError> {
        if self.rooms.contains_key(tag) {
            return Err(RegistryError::DuplicateType(tag.to_string()));
        }
        self.rooms.insert(tag.to_string(), factory);
        debug!(tag, "room_type_registered");
        Ok(())
    }

    pub(crate) fn is_serializable(&self, thing: &Thing) -> bool {
        thing.kind().is_serializable()
    }

    pub(crate) fn serialize_thing(&self, thing: &Thing) -> Result<Value, RegistryError> {
        let (tag, record) = match thing.kind() {
            ThingKind::Player(inner) => encode(inner, self)?,
            ThingKind::Door(inner) => encode(inner, self)?,
            ThingKind::ResourceSpawner(inner) => encode(inner, self)?,
            ThingKind::PuzzleObjectSpawner(inner) => encode(inner, self)?,
            ThingKind::Container(inner) => encode(inner, self)?,
            ThingKind::Cabinet(inner) => encode(inner, self)?,
            ThingKind::Cauldron(inner) => encode(inner, self)?,
            ThingKind::Furnace(inner) => encode(inner, self)?,
            ThingKind::AnimatedObject(inner) => encode(inner, self)?,
            ThingKind::Npc(inner) => encode(inner, self)?,
            ThingKind::Plants(inner) => encode(inner, self)?,
            ThingKind::FlagSwitcher(inner) => encode(inner, self)?,
            ThingKind::Puff(_) => {
                return Err(RegistryError::NotSerializable(thing.kind().thing_type()))
            }
        };
        if !self.things.contains_key(tag) {
            return Err(RegistryError::UnregisteredType(tag.to_string()));
        }
        Ok(tagged(tag, record))
    }

    pub(crate) fn deserialize_thing(
        &self,
        record: Value,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Thing, RegistryError> {
        let (tag, record) = split_tag(record)?;
        let factory = self
            .things
            .get(&tag)
            .ok_or(RegistryError::UnregisteredType(tag))?;
        let kind = factory(record, ctx)?;
        let mut thing = Thing::new(ctx.ids.allocate(), kind);
        thing.set_room(ctx.room);
        Ok(thing)
    }

    pub(crate) fn serialize_room(&self, room: &Room) -> Result<Value, RegistryError> {
        let tag = room.kind().tag();
        if !self.rooms.contains_key(tag) {
            return Err(RegistryError::UnregisteredType(tag.to_string()));
        }
        let record = room.to_record(self)?;
        let value =
            serde_json::to_value(record).map_err(|source| RegistryError::Encode { tag, source })?;
        Ok(tagged(tag, value))
    }

    pub(crate) fn deserialize_room(
        &self,
        record: Value,
        ctx: &mut LoadContext<'_>,
    ) -> Result<Room, RegistryError> {
        let (tag, record) = split_tag(record)?;
        let factory = self
            .rooms
            .get(&tag)
            .ok_or_else(|| RegistryError::UnregisteredType(tag.clone()))?;
        let record: RoomRecord = decode(&tag, record)?;
        factory(record, ctx)
    }
}

fn load_thing<T: Persisted>(
    value: Value,
    ctx: &mut LoadContext<'_>,
) -> Result<ThingKind, RegistryError> {
    let record: T::Record = decode(T::TAG, value)?;
    Ok(T::from_record(record, ctx)?.into())
}

fn encode<T: Persisted>(thing: &T, registry: &Registry) -> Result<(&'static str, Value), RegistryError> {
    let record = thing.to_record(registry)?;
    let value = serde_json::to_value(record).map_err(|source| RegistryError::Encode {
        tag: T::TAG,
        source,
    })?;
    Ok((T::TAG, value))
}

fn decode<R: DeserializeOwned>(tag: &str, value: Value) -> Result<R, RegistryError> {
    serde_path_to_error::deserialize(value).map_err(|err| RegistryError::InvalidRecord {
        tag: tag.to_string(),
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

fn split_tag(record: Value) -> Result<(String, Value), RegistryError> {
    let Value::Object(mut fields) = record else {
        return Err(RegistryError::MissingTypeTag);
    };
    match fields.remove(TYPE_KEY) {
        Some(Value::String(tag)) => Ok((tag, Value::Object(fields))),
        _ => Err(RegistryError::MissingTypeTag),
    }
}

fn tagged(tag: &str, record: Value) -> Value {
    let mut fields = match record {
        Value::Object(fields) => fields,
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), other);
            fields
        }
    };
    fields.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    Value::Object(fields)
}
