//! Device interfaces ordered by their names.
//!
//! Interface names such as `GigabitEthernet1/0/10` or `xe-0/0/1:2` embed a
//! hierarchy of numbers. The numeric components are extracted into the six
//! natural ordering slots:
//!
//! | slot | component       | in `Gi1/0/3/2:1.100` |
//! |------|-----------------|----------------------|
//! | 1    | slot            | 1                    |
//! | 2    | subslot         | 0                    |
//! | 3    | position        | 3                    |
//! | 4    | port id         | 2                    |
//! | 5    | channel         | 1                    |
//! | 6    | virtual circuit | 100                  |
//!
//! Components missing from a name stay unset.

use audit_engine::Auditable;
use lazy_static::lazy_static;
use natural_order::{NaturalOrderKey, NaturallyOrderable, OrderingError, OrderingResult};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::RepositoryResult;
use crate::models::{ChangeLoggedFields, Record};

lazy_static! {
    static ref INTERFACE_NAME_REGEX: Option<Regex> = Regex::new(
        r"^(?P<type>[^\d.:]+)?((?P<slot>\d+)/)?((?P<subslot>\d+)/)?((?P<position>\d+)/)?(?P<id>\d+)?(:(?P<channel>\d+))?(\.(?P<vc>\d+))?"
    )
    .ok();
}

const COMPONENTS: [&str; 6] = ["slot", "subslot", "position", "id", "channel", "vc"];

/// Derive the natural ordering key for an interface name
///
/// # Errors
///
/// Returns [`OrderingError::ValueRange`] when a numeric component is larger
/// than a slot can hold, or [`OrderingError::DigitsRange`] carrying the digits
/// as written when the component does not even fit an `i64`.
pub fn naturalize_interface(name: &str) -> OrderingResult<NaturalOrderKey> {
    let mut key = NaturalOrderKey::unset();

    if let Some(caps) = INTERFACE_NAME_REGEX.as_ref().and_then(|re| re.captures(name)) {
        for (index, component) in COMPONENTS.iter().enumerate() {
            let slot = index + 1;
            key.set(slot, component_value(&caps, component, slot)?)?;
        }
    }

    debug!(name = %name, key = %key, "Naturalized interface name");
    Ok(key)
}

fn component_value(caps: &Captures<'_>, component: &str, slot: usize) -> OrderingResult<Option<i64>> {
    caps.name(component)
        .map(|m| {
            m.as_str().parse::<i64>().map_err(|_| OrderingError::DigitsRange {
                slot,
                digits: m.as_str().to_string(),
            })
        })
        .transpose()
}

/// A network interface on a device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interface {
    pub id: Uuid,
    pub device: String,
    pub name: String,
    pub enabled: bool,
    pub description: String,
    #[serde(flatten)]
    pub timestamps: ChangeLoggedFields,
    #[serde(skip)]
    natural_key: NaturalOrderKey,
}

impl Interface {
    /// # Errors
    ///
    /// Returns an ordering error if the name has a component above 65535.
    pub fn new(device: impl Into<String>, name: impl Into<String>) -> OrderingResult<Self> {
        let mut interface = Self {
            id: Uuid::new_v4(),
            device: device.into(),
            name: name.into(),
            enabled: true,
            description: String::new(),
            timestamps: ChangeLoggedFields::new(),
            natural_key: NaturalOrderKey::unset(),
        };
        interface.refresh_natural_key()?;
        Ok(interface)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Rename the interface; on error neither the name nor the key change
    ///
    /// # Errors
    ///
    /// Returns an ordering error if the new name has a component above 65535.
    pub fn rename(&mut self, name: impl Into<String>) -> OrderingResult<()> {
        let name = name.into();
        self.natural_key = naturalize_interface(&name)?;
        self.name = name;
        Ok(())
    }
}

impl NaturallyOrderable for Interface {
    fn natural_key(&self) -> &NaturalOrderKey {
        &self.natural_key
    }

    fn refresh_natural_key(&mut self) -> OrderingResult<()> {
        self.natural_key = naturalize_interface(&self.name)?;
        Ok(())
    }
}

impl Auditable for Interface {
    const OBJECT_TYPE: &'static str = "dcim.interface";

    fn object_id(&self) -> Uuid {
        self.id
    }

    fn object_repr(&self) -> String {
        format!("{} {}", self.device, self.name)
    }
}

impl Record for Interface {
    fn timestamps(&self) -> &ChangeLoggedFields {
        &self.timestamps
    }

    fn timestamps_mut(&mut self) -> &mut ChangeLoggedFields {
        &mut self.timestamps
    }

    fn prepare_save(&mut self) -> RepositoryResult<()> {
        self.refresh_natural_key()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use natural_order::sort_naturally;

    fn slots(name: &str) -> [Option<u16>; 6] {
        naturalize_interface(name).unwrap().slots()
    }

    #[test]
    fn test_naturalize_simple_names() {
        assert_eq!(slots("eth0"), [None, None, None, Some(0), None, None]);
        assert_eq!(slots("mgmt"), [None; 6]);
    }

    #[test]
    fn test_naturalize_hierarchical_names() {
        assert_eq!(
            slots("GigabitEthernet1/0/3"),
            [Some(1), Some(0), None, Some(3), None, None]
        );
        assert_eq!(
            slots("Gi1/0/3/2:1.100"),
            [Some(1), Some(0), Some(3), Some(2), Some(1), Some(100)]
        );
        assert_eq!(
            slots("xe-0/0/1:2"),
            [Some(0), Some(0), None, Some(1), Some(2), None]
        );
        assert_eq!(
            slots("Ethernet1/2.100"),
            [Some(1), None, None, Some(2), None, Some(100)]
        );
    }

    #[test]
    fn test_oversized_component_is_rejected() {
        let err = naturalize_interface("Ethernet1/70000").unwrap_err();
        assert_eq!(err, OrderingError::ValueRange { slot: 4, value: 70000 });

        let err = naturalize_interface("eth99999999999999999999").unwrap_err();
        assert_eq!(
            err,
            OrderingError::DigitsRange {
                slot: 4,
                digits: "99999999999999999999".to_string(),
            }
        );
        assert!(err.to_string().contains("99999999999999999999"));
    }

    #[test]
    fn test_largest_component_is_accepted() {
        assert_eq!(slots("vlan65535")[3], Some(65535));
    }

    #[test]
    fn test_interfaces_sort_naturally() {
        let mut interfaces: Vec<Interface> = ["Ethernet1/10", "Ethernet1/2", "Ethernet1/1", "Ethernet2/1", "mgmt0"]
            .iter()
            .map(|name| Interface::new("sw1", *name).unwrap())
            .collect();

        sort_naturally(&mut interfaces);

        let names: Vec<&str> = interfaces.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["mgmt0", "Ethernet1/1", "Ethernet1/2", "Ethernet1/10", "Ethernet2/1"]
        );
    }

    #[test]
    fn test_failed_rename_keeps_name_and_key() {
        let mut interface = Interface::new("sw1", "Ethernet1/2").unwrap();
        let before = *interface.natural_key();

        assert!(interface.rename("Ethernet1/99999").is_err());
        assert_eq!(interface.name, "Ethernet1/2");
        assert_eq!(*interface.natural_key(), before);

        interface.rename("Ethernet1/3").unwrap();
        assert_eq!(interface.natural_key().get(4), Some(3));
    }

    #[test]
    fn test_snapshot_omits_derived_key() {
        let interface = Interface::new("sw1", "Ethernet1/2").unwrap();
        let value = serde_json::to_value(&interface).unwrap();

        assert_eq!(value["name"], "Ethernet1/2");
        assert!(value.get("natural_key").is_none());
        assert!(value.get("created").is_some());
    }
}
