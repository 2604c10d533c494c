//! Process-wide name→constructor tables for eviction policies and
//! serializers, populated by built-ins and extensible before a cache is
//! constructed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::{CacheError, CacheResult};
use crate::policy::{self, EvictionPolicy};
use crate::serializer::{self, Serializer};

type SerializerFactory = Box<dyn Fn() -> Box<dyn Serializer> + Send + Sync>;

static SERIALIZERS: OnceLock<Mutex<HashMap<String, SerializerFactory>>> = OnceLock::new();

fn serializer_table() -> &'static Mutex<HashMap<String, SerializerFactory>> {
    SERIALIZERS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register a serializer constructor under `name`. Fails with
/// `RegistryError` if `name` is already taken (including by a built-in).
pub fn register_serializer(
    name: impl Into<String>,
    factory: impl Fn() -> Box<dyn Serializer> + Send + Sync + 'static,
) -> CacheResult<()> {
    let name = name.into();
    if serializer::build_builtin(&name).is_some() {
        return Err(CacheError::Registry(format!(
            "serializer '{name}' is already registered"
        )));
    }
    let mut table = serializer_table().lock();
    if table.contains_key(&name) {
        return Err(CacheError::Registry(format!(
            "serializer '{name}' is already registered"
        )));
    }
    table.insert(name, Box::new(factory));
    Ok(())
}

/// Resolve a serializer by name: built-ins first, then user registrations.
pub fn get_serializer(name: &str) -> CacheResult<Box<dyn Serializer>> {
    if let Some(builtin) = serializer::build_builtin(name) {
        return Ok(builtin);
    }
    let table = serializer_table().lock();
    table
        .get(name)
        .map(|factory| factory())
        .ok_or_else(|| CacheError::Registry(format!("unknown serializer '{name}'")))
}

/// Eviction policy constructors are generic over the cache's key type `K`,
/// but the table is a single process-wide map. Each constructor closure is
/// boxed as `dyn Any` and keyed by `(name, TypeId::of::<K>())`; looking it
/// up downcasts back to the concrete closure type for that `K`.
type PolicyFactory<K> = Box<dyn Fn() -> Box<dyn EvictionPolicy<K>> + Send + Sync>;

static POLICIES: OnceLock<Mutex<HashMap<(String, TypeId), Box<dyn Any + Send + Sync>>>> =
    OnceLock::new();

fn policy_table() -> &'static Mutex<HashMap<(String, TypeId), Box<dyn Any + Send + Sync>>> {
    POLICIES.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Register an eviction policy constructor under `name` for key type `K`.
/// Fails with `RegistryError` if `name` is already taken for this `K`
/// (including by a built-in).
pub fn register_eviction_policy<K>(
    name: impl Into<String>,
    factory: impl Fn() -> Box<dyn EvictionPolicy<K>> + Send + Sync + 'static,
) -> CacheResult<()>
where
    K: Clone + Eq + std::hash::Hash + Send + 'static,
{
    let name = name.into();
    if policy::build_builtin::<K>(&name).is_some() {
        return Err(CacheError::Registry(format!(
            "eviction policy '{name}' is already registered"
        )));
    }
    let mut table = policy_table().lock();
    let key = (name.clone(), TypeId::of::<K>());
    if table.contains_key(&key) {
        return Err(CacheError::Registry(format!(
            "eviction policy '{name}' is already registered"
        )));
    }
    let boxed: PolicyFactory<K> = Box::new(factory);
    table.insert(key, Box::new(boxed));
    Ok(())
}

/// Resolve an eviction policy by name for key type `K`: built-ins first,
/// then user registrations.
pub fn get_eviction_policy<K>(name: &str) -> CacheResult<Box<dyn EvictionPolicy<K>>>
where
    K: Clone + Eq + std::hash::Hash + Send + 'static,
{
    if let Some(builtin) = policy::build_builtin::<K>(name) {
        return Ok(builtin);
    }
    let table = policy_table().lock();
    let key = (name.to_string(), TypeId::of::<K>());
    table
        .get(&key)
        .and_then(|boxed| boxed.downcast_ref::<PolicyFactory<K>>())
        .map(|factory| factory())
        .ok_or_else(|| CacheError::Registry(format!("unknown eviction policy '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;

    #[test]
    fn builtin_serializers_resolve() {
        assert!(get_serializer("json").is_ok());
        assert!(get_serializer("pickle").is_ok());
        assert!(get_serializer("nonexistent").is_err());
    }

    #[test]
    fn builtin_policies_resolve_for_str_keys() {
        assert!(get_eviction_policy::<&str>("lru").is_ok());
        assert!(get_eviction_policy::<&str>("lfu").is_ok());
        assert!(get_eviction_policy::<&str>("fifo").is_ok());
        assert!(get_eviction_policy::<&str>("nonexistent").is_err());
    }

    #[test]
    fn registering_over_a_builtin_name_fails() {
        let err = register_serializer("json", || Box::new(JsonSerializer)).unwrap_err();
        assert!(matches!(err, CacheError::Registry(_)));
    }
}
