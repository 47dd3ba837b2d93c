use dicom_viewport::FrameCache;

// ----------------------------------------------------------------------------
// Capacity bound
// ----------------------------------------------------------------------------

#[test]
fn size_never_exceeds_capacity() {
    let mut cache = FrameCache::new(3);
    for key in 0..20u32 {
        cache.put(key % 7, key);
        assert!(cache.len() <= 3);
    }
    assert_eq!(cache.len(), 3);
}

#[test]
fn survivors_are_the_most_recently_inserted() {
    let mut cache = FrameCache::new(3);
    for key in ["a", "b", "c", "d", "e"] {
        cache.put(key.to_string(), key.len());
    }
    let keys: Vec<&str> = cache.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["c", "d", "e"]);
    assert!(cache.get(&"a".to_string()).is_none());
}

// ----------------------------------------------------------------------------
// Recency
// ----------------------------------------------------------------------------

#[test]
fn reinserting_refreshes_but_reading_does_not() {
    let mut cache = FrameCache::new(2);
    cache.put("x", 1);
    cache.put("y", 2);

    // a read leaves "x" the oldest entry
    assert_eq!(cache.get(&"x"), Some(&1));
    cache.put("z", 3);
    assert!(!cache.contains_key(&"x"));

    // a reinsert makes "y" the newest entry
    cache.put("y", 20);
    cache.put("w", 4);
    assert_eq!(cache.get(&"y"), Some(&20));
    assert!(!cache.contains_key(&"z"));
}

#[test]
fn default_capacity_is_eight() {
    let mut cache = FrameCache::default();
    for key in 0..10 {
        cache.put(key, ());
    }
    assert_eq!(cache.capacity(), 8);
    assert_eq!(cache.len(), 8);
    assert_eq!(cache.keys().next(), Some(&2));
}
