use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use multichain_wallet::chain::{EthereumStrategy, SolanaStrategy};
use multichain_wallet::wallet::{AccountDeriver, MnemonicPhrase};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn derivation(c: &mut Criterion) {
    let seed = MnemonicPhrase::from_phrase(PHRASE).unwrap().to_seed();
    let solana = AccountDeriver::new(Arc::new(SolanaStrategy));
    let ethereum = AccountDeriver::new(Arc::new(EthereumStrategy));

    c.bench_function("seed from phrase", |b| {
        b.iter(|| MnemonicPhrase::from_phrase(black_box(PHRASE)).unwrap().to_seed())
    });
    c.bench_function("solana derive 10", |b| {
        b.iter(|| solana.derive_many(black_box(&seed), 10).unwrap())
    });
    c.bench_function("ethereum derive 10", |b| {
        b.iter(|| ethereum.derive_many(black_box(&seed), 10).unwrap())
    });
}

criterion_group!(benches, derivation);
criterion_main!(benches);
