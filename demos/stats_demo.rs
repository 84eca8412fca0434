use std::collections::hash_map::RandomState;

use chain_hash::BucketHasher;
use chain_hash::HashMap;
use chain_hash::PositionalHasher;
use chain_hash::hasher::Modular;
use clap::Parser;
use clap::ValueEnum;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Hasher {
    /// The positional prime fold.
    Positional,
    /// std's SipHash reduced modulo the capacity.
    Sip,
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "keys", default_value_t = 1000)]
    keys: usize,

    #[arg(short = 'c', long = "capacity", default_value_t = 16)]
    capacity: usize,

    #[arg(long = "hasher", value_enum, default_value_t = Hasher::Positional)]
    hasher: Hasher,
}

fn fill<H: BucketHasher>(mut map: HashMap<usize, H>, keys: usize) {
    println!("Initial capacity: {}", map.capacity());

    let mut resizes = 0;
    let mut capacity = map.capacity();
    for i in 0..keys {
        map.set(format!("key_{i}"), i);
        if map.capacity() != capacity {
            resizes += 1;
            capacity = map.capacity();
        }
    }

    println!("Inserted {} keys, {} rehashes", map.len(), resizes);
    println!("Final capacity: {}", map.capacity());
    println!("Final load factor: {:.2}%", map.load_factor() * 100.0);
    assert_eq!(map.len(), map.length());

    map.chain_histogram().print();
    map.debug_stats().print();
}

fn main() {
    let args = Args::parse();

    println!("Filling a {:?} table with {} keys", args.hasher, args.keys);

    match args.hasher {
        Hasher::Positional => fill(
            HashMap::with_capacity_and_hasher(args.capacity, PositionalHasher),
            args.keys,
        ),
        Hasher::Sip => fill(
            HashMap::with_capacity_and_hasher(args.capacity, Modular(RandomState::new())),
            args.keys,
        ),
    }
}
