//! Issue-keyed maps with string keys on the wire.
//!
//! JSON object keys are strings, and serde replays buffered map keys (for
//! example inside internally tagged enums) as strings too, so integer keys
//! would fail to round-trip. Issue ids therefore cross the boundary as
//! decimal strings and are parsed back on input.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{Error, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::IssueId;

pub fn serialize<S, V>(map: &BTreeMap<IssueId, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    let mut state = serializer.serialize_map(Some(map.len()))?;
    for (id, value) in map {
        state.serialize_entry(&id.to_string(), value)?;
    }
    state.end()
}

pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<IssueId, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct IssueMap<V>(PhantomData<V>);

    impl<'de, V> Visitor<'de> for IssueMap<V>
    where
        V: Deserialize<'de>,
    {
        type Value = BTreeMap<IssueId, V>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a map keyed by issue ids")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                let id = key
                    .parse::<IssueId>()
                    .map_err(|_| A::Error::custom(format!("invalid issue id: {key}")))?;
                map.insert(id, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(IssueMap(PhantomData))
}
