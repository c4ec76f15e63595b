//! Domain types shared by the unit tests

use std::sync::LazyLock;

use ujorm_core::{ujo_keys, ujo_store, ArrayStore, MapStore};

use crate::meta::{Column, OrmUjo, TableModel};

#[derive(Debug, Clone)]
pub struct City {
    data: MapStore,
}

ujo_keys! {
    pub struct CityKeys for City {
        id: i64,
        name: String,
    }
}

static CITY_KEYS: LazyLock<CityKeys> = LazyLock::new(|| CityKeys::new().expect("city keys"));

ujo_store!(City, data);

impl OrmUjo for City {
    fn new_instance() -> Self {
        City {
            data: MapStore::new(CITY_KEYS.key_list.clone()),
        }
    }
}

impl City {
    pub fn keys() -> &'static CityKeys {
        &CITY_KEYS
    }

    pub fn of(name: &str) -> Self {
        let mut city = Self::new_instance();
        Self::keys().name.set_value(&mut city, name.to_string()).unwrap();
        city
    }

    pub fn table_model() -> TableModel<City> {
        TableModel::new("city").column(&Self::keys().id, Column::new().pk())
    }
}

#[derive(Debug, Clone)]
pub struct Person {
    data: ArrayStore,
}

ujo_keys! {
    pub struct PersonKeys for Person {
        id: i64,
        name: String,
        cash: f64,
        code: String,
        city: ref City,
    }
}

static PERSON_KEYS: LazyLock<PersonKeys> =
    LazyLock::new(|| PersonKeys::new().expect("person keys"));

ujo_store!(Person, data);

impl OrmUjo for Person {
    fn new_instance() -> Self {
        Person {
            data: ArrayStore::new(PERSON_KEYS.key_list.clone()),
        }
    }
}

impl Person {
    pub fn keys() -> &'static PersonKeys {
        &PERSON_KEYS
    }

    pub fn of(name: &str, cash: f64, code: &str) -> Self {
        let keys = Self::keys();
        let mut person = Self::new_instance();
        keys.name.set_value(&mut person, name.to_string()).unwrap();
        keys.cash.set_value(&mut person, cash).unwrap();
        keys.code.set_value(&mut person, code.to_string()).unwrap();
        person
    }

    pub fn table_model() -> TableModel<Person> {
        let keys = Self::keys();
        TableModel::new("person")
            .column(&keys.id, Column::new().pk())
            .column(&keys.name, Column::new().length(64))
            .column(&keys.code, Column::new().length(10).unique_index("uq_person_code"))
            .relation(&keys.city, Column::named("city_id"))
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    data: ArrayStore,
}

ujo_keys! {
    pub struct RoomKeys for Room {
        building: i32,
        number: i32,
        label: String,
    }
}

static ROOM_KEYS: LazyLock<RoomKeys> = LazyLock::new(|| RoomKeys::new().expect("room keys"));

ujo_store!(Room, data);

impl OrmUjo for Room {
    fn new_instance() -> Self {
        Room {
            data: ArrayStore::new(ROOM_KEYS.key_list.clone()),
        }
    }
}

impl Room {
    pub fn keys() -> &'static RoomKeys {
        &ROOM_KEYS
    }

    pub fn of(building: i32, number: i32, label: &str) -> Self {
        let keys = Self::keys();
        let mut room = Self::new_instance();
        keys.building.set_value(&mut room, building).unwrap();
        keys.number.set_value(&mut room, number).unwrap();
        keys.label.set_value(&mut room, label.to_string()).unwrap();
        room
    }

    pub fn table_model() -> TableModel<Room> {
        let keys = Self::keys();
        TableModel::new("room")
            .column(&keys.building, Column::new().pk())
            .column(&keys.number, Column::new().pk())
    }
}

#[derive(Debug, Clone)]
pub struct Booking {
    data: ArrayStore,
}

ujo_keys! {
    pub struct BookingKeys for Booking {
        id: i64,
        room: ref Room,
        note: String,
    }
}

static BOOKING_KEYS: LazyLock<BookingKeys> =
    LazyLock::new(|| BookingKeys::new().expect("booking keys"));

ujo_store!(Booking, data);

impl OrmUjo for Booking {
    fn new_instance() -> Self {
        Booking {
            data: ArrayStore::new(BOOKING_KEYS.key_list.clone()),
        }
    }
}

impl Booking {
    pub fn keys() -> &'static BookingKeys {
        &BOOKING_KEYS
    }

    pub fn table_model() -> TableModel<Booking> {
        let keys = Self::keys();
        TableModel::new("booking")
            .column(&keys.id, Column::new().pk())
            .relation(&keys.room, Column::new())
    }
}
