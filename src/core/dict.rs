use crate::core::error::LispError;
use crate::core::value::Handle;

/// Capacity schedule. Resizing walks this table; running off the end is a
/// resource error.
const PRIMES: [usize; 28] = [
    11, 23, 47, 97, 197, 397, 797, 1597, 3203, 6421, 12853, 25717, 51437, 102877, 205759, 411527,
    823117, 1646237, 3292489, 6584983, 13169977, 26339969, 52679969, 105359939, 210719881,
    421439783, 842879579, 1685759167,
];

enum Probe {
    Found(usize),
    Vacant(usize),
    Full,
}

/// Open-addressed hash table keyed by object identity.
///
/// The hash is the key's handle index and probing is quadratic
/// (`(hash + i*i) mod capacity`). Two structurally identical values with
/// different identities are distinct keys. Load factor is kept at or below
/// one half.
#[derive(Debug, Clone)]
pub struct DictTable {
    keys: Vec<Option<Handle>>,
    vals: Vec<Option<Handle>>,
    len: usize,
    prime_idx: usize,
}

impl Default for DictTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DictTable {
    pub fn new() -> Self {
        Self {
            keys: vec![None; PRIMES[0]],
            vals: vec![None; PRIMES[0]],
            len: 0,
            prime_idx: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn probe(&self, key: Handle) -> Probe {
        let cap = self.keys.len();
        let hash = key.0 as usize;
        for i in 0..cap {
            let j = (hash + i * i) % cap;
            match self.keys[j] {
                None => return Probe::Vacant(j),
                Some(k) if k == key => return Probe::Found(j),
                Some(_) => {}
            }
        }
        Probe::Full
    }

    /// Look up by identity. `None` is the absent sentinel, distinct from
    /// any stored value.
    pub fn get(&self, key: Handle) -> Option<Handle> {
        match self.probe(key) {
            Probe::Found(j) => self.vals[j],
            _ => None,
        }
    }

    pub fn set(&mut self, key: Handle, val: Handle) -> Result<(), LispError> {
        match self.probe(key) {
            Probe::Found(j) => {
                self.vals[j] = Some(val);
                Ok(())
            }
            Probe::Vacant(j) => {
                self.keys[j] = Some(key);
                self.vals[j] = Some(val);
                self.len += 1;
                if self.len > self.keys.len() / 2 {
                    self.grow()?;
                }
                Ok(())
            }
            Probe::Full => Err(LispError::Resource(
                "dict probe sequence exhausted".to_string(),
            )),
        }
    }

    fn grow(&mut self) -> Result<(), LispError> {
        if self.prime_idx + 1 >= PRIMES.len() {
            return Err(LispError::Resource(
                "dict is already at maximum size".to_string(),
            ));
        }
        self.prime_idx += 1;
        let cap = PRIMES[self.prime_idx];
        let old_keys = std::mem::replace(&mut self.keys, vec![None; cap]);
        let old_vals = std::mem::replace(&mut self.vals, vec![None; cap]);
        self.len = 0;
        for (k, v) in old_keys.into_iter().zip(old_vals) {
            if let (Some(k), Some(v)) = (k, v) {
                self.set(k, v)?;
            }
        }
        Ok(())
    }

    /// Occupied entries, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, Handle)> + '_ {
        self.keys
            .iter()
            .zip(self.vals.iter())
            .filter_map(|(k, v)| Some(((*k)?, (*v)?)))
    }

    pub fn byte_size(&self) -> usize {
        2 * self.keys.len() * std::mem::size_of::<Option<Handle>>()
    }
}
