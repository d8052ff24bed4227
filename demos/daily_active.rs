use bitmap_string::{BitmapString, GrowthPolicy, MemoryStorage, Options};

const KEY: &[u8] = b"active:monday";

fn main() {
    let store = MemoryStorage::new();
    let options = Options::default().with_growth(GrowthPolicy::ZeroFill);
    let bitmap = BitmapString::with_options(&store, "analytics", options);

    for user_id in [3, 7, 8, 42, 1000] {
        bitmap.set_bit_by_key(KEY, user_id, true).unwrap();
    }

    let active = bitmap.bit_count_by_key(KEY, None, None).unwrap();
    let first = bitmap.bit_pos_by_key(KEY, true, None, None).unwrap();
    let first_idle = bitmap.bit_pos_by_key(KEY, false, None, None).unwrap();
    println!("active users: {active}, first active: {first}, first idle: {first_idle}");
    println!("user 42 active: {}", bitmap.get_bit_by_key(KEY, 42).unwrap());
    println!("batches written: {}", store.sequence());
}
