use std::collections::{HashMap, HashSet};

use drift_domain::{Provider as ProviderKind, Resource};

/// Result of matching declared resource instances against a live snapshot.
pub struct Correlation {
    pub matched: Vec<(Resource, Resource)>,
    pub missing: Vec<Resource>,
    pub unmanaged: Vec<Resource>,
}

/// Match by `(provider, type, id)` first, falling back to
/// `(provider, type, name, region)`. A live resource is consumed by at most
/// one declared match.
pub fn correlate(declared: Vec<Resource>, live: Vec<Resource>) -> Correlation {
    let mut by_id: HashMap<(ProviderKind, String, String), usize> = HashMap::new();
    let mut by_name: HashMap<(ProviderKind, String, String, String), usize> = HashMap::new();
    for (i, l) in live.iter().enumerate() {
        by_id.entry((l.provider, l.resource_type.clone(), l.id.clone())).or_insert(i);
        by_name
            .entry((l.provider, l.resource_type.clone(), l.name.clone(), l.region.clone()))
            .or_insert(i);
    }

    let mut consumed: HashSet<usize> = HashSet::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();

    for d in declared {
        let key_id = (d.provider, d.resource_type.clone(), d.id.clone());
        let key_name = (d.provider, d.resource_type.clone(), d.name.clone(), d.region.clone());
        let found = by_id
            .get(&key_id)
            .filter(|i| !consumed.contains(i))
            .or_else(|| by_name.get(&key_name).filter(|i| !consumed.contains(i)))
            .copied();

        match found {
            Some(i) => {
                consumed.insert(i);
                matched.push((d, live[i].clone()));
            }
            None => missing.push(d),
        }
    }

    let unmanaged = live
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !consumed.contains(i))
        .map(|(_, l)| l)
        .collect();

    Correlation { matched, missing, unmanaged }
}
