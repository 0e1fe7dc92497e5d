use std::hint::black_box;

use chainsweeper_core::*;
use criterion::{Criterion, criterion_group, criterion_main};

fn expert_board(seed: u64, safe: Coord2) -> Board {
    let (size, mines) = {
        let config = Difficulty::Expert.config();
        (config.size, config.mines)
    };
    RandomMineGenerator::from_seed(seed)
        .place_mines(&Board::new(size), mines, safe)
        .unwrap()
}

fn generation(c: &mut Criterion) {
    let empty = Board::new(Difficulty::Expert.config().size);
    let mut generator = RandomMineGenerator::from_seed(7);
    c.bench_function("expert mine placement", |b| {
        b.iter(|| generator.place_mines(black_box(&empty), 99, (15, 8)).unwrap())
    });
}

fn flood(c: &mut Criterion) {
    let board = expert_board(7, (15, 8));
    c.bench_function("expert flood fill", |b| {
        b.iter(|| flood_fill(black_box(&board), (15, 8)).unwrap())
    });

    // few mines, so one click floods nearly the whole board
    let sparse = RandomMineGenerator::from_seed(7)
        .place_mines(&Board::new((30, 16)), 10, (0, 0))
        .unwrap();
    c.bench_function("sparse flood fill", |b| {
        b.iter(|| flood_fill(black_box(&sparse), (0, 0)).unwrap())
    });
}

criterion_group!(benches, generation, flood);
criterion_main!(benches);
