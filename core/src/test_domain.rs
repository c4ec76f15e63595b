//! Domain types shared by the unit tests

use std::sync::LazyLock;

use crate::error::Result;
use crate::models::{AnyKey, KeyList, Value};
use crate::ujo::{ArrayStore, MapStore, Ujo};

#[derive(Debug, Clone)]
pub struct Person {
    data: ArrayStore,
}

crate::ujo_keys! {
    pub struct PersonKeys for Person {
        id: i64,
        name: String = String::new(),
        cash: f64,
        male: bool,
    }
}

static PERSON_KEYS: LazyLock<PersonKeys> =
    LazyLock::new(|| PersonKeys::new().expect("person keys"));

crate::ujo_store!(Person, data);

impl Person {
    pub fn keys() -> &'static PersonKeys {
        &PERSON_KEYS
    }

    pub fn new() -> Self {
        Person {
            data: ArrayStore::new(PERSON_KEYS.key_list.clone()),
        }
    }

    pub fn of(id: i64, name: &str, cash: f64) -> Self {
        let keys = Self::keys();
        let mut person = Self::new();
        keys.id.set_value(&mut person, id).unwrap();
        keys.name.set_value(&mut person, name.to_string()).unwrap();
        keys.cash.set_value(&mut person, cash).unwrap();
        person
    }
}

#[derive(Debug, Clone)]
pub struct Address {
    data: MapStore,
}

crate::ujo_keys! {
    pub struct AddressKeys for Address {
        id: i64,
        city: String,
    }
}

static ADDRESS_KEYS: LazyLock<AddressKeys> =
    LazyLock::new(|| AddressKeys::new().expect("address keys"));

crate::ujo_store!(Address, data);

impl Address {
    pub fn keys() -> &'static AddressKeys {
        &ADDRESS_KEYS
    }

    pub fn new() -> Self {
        Address {
            data: MapStore::new(ADDRESS_KEYS.key_list.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Customer {
    data: ArrayStore,
    address: Option<Address>,
}

crate::ujo_keys! {
    pub struct CustomerKeys for Customer {
        id: i64,
        name: String,
        address: ref Address,
    }
}

static CUSTOMER_KEYS: LazyLock<CustomerKeys> =
    LazyLock::new(|| CustomerKeys::new().expect("customer keys"));

impl Customer {
    pub fn keys() -> &'static CustomerKeys {
        &CUSTOMER_KEYS
    }

    pub fn new() -> Self {
        Customer {
            data: ArrayStore::new(CUSTOMER_KEYS.key_list.clone()),
            address: None,
        }
    }

    pub fn set_address(&mut self, address: Address) {
        let id = address.read_value(Address::keys().id.untyped());
        Self::keys().address.set_reference(self, id).unwrap();
        self.address = Some(address);
    }
}

impl Ujo for Customer {
    fn read_keys(&self) -> &KeyList {
        self.data.read_keys()
    }

    fn read_value(&self, key: &AnyKey) -> Value {
        self.data.read_value(key)
    }

    fn write_value(&mut self, key: &AnyKey, value: Value) -> Result<()> {
        self.data.write_value(key, value)
    }

    fn read_related(&self, key: &AnyKey) -> Option<&dyn Ujo> {
        if key == Self::keys().address.untyped() {
            self.address.as_ref().map(|a| a as &dyn Ujo)
        } else {
            None
        }
    }
}
