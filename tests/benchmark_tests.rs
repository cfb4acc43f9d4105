//! Performance benchmarks for the rule engines and the wire format

use bincode::{deserialize, serialize};
use shared::games::cards::{classify, Card, Suit};
use shared::games::chess::{destinations, ChessBoard};
use shared::games::go::liberties;
use shared::games::military::railway::engineer_path;
use shared::{Board, Event, GameKind, Grid, Packet, Pos, Stone, MAX_PACKET_SIZE};
use std::time::Instant;

/// Benchmarks the liberty flood fill on a board-spanning group
#[test]
fn benchmark_go_liberties() {
    let mut grid: Grid<Option<Stone>> = Grid::new(19, 19);
    // A comb of black stones: every even row plus column 0
    for row in 0..19 {
        for col in 0..19 {
            if row % 2 == 0 || col == 0 {
                grid.set(Pos::new(row, col), Some(Stone::Black));
            }
        }
    }

    let iterations = 1_000;
    let start = Instant::now();
    let mut group_size = 0;
    for _ in 0..iterations {
        group_size = liberties(&grid, Pos::new(0, 0), Stone::Black).stones.len();
    }
    let duration = start.elapsed();
    println!(
        "Go liberties: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(group_size, 10 * 19 + 9);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks pattern destinations for every piece of the opening position
#[test]
fn benchmark_chess_destinations() {
    let board = ChessBoard::new();
    let pieces: Vec<Pos> = board.grid().occupied().map(|(pos, _)| pos).collect();

    let iterations = 10_000;
    let start = Instant::now();
    let mut total = 0;
    for _ in 0..iterations {
        total = pieces.iter().map(|pos| destinations(&board, *pos).len()).sum::<usize>();
    }
    let duration = start.elapsed();
    println!("Chess destinations: {} iterations in {:?}", iterations, duration);

    assert!(total > 0);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks the engineer's breadth-first railway search
#[test]
fn benchmark_railway_search() {
    let iterations = 10_000;
    let start = Instant::now();
    for _ in 0..iterations {
        let path = engineer_path(Pos::new(1, 0), Pos::new(10, 4), |_| false);
        assert!(path.is_some());
    }
    let duration = start.elapsed();
    println!("Railway search: {} iterations in {:?}", iterations, duration);

    assert!(duration.as_secs() < 5);
}

/// Benchmarks combination classification on a long airplane with wings
#[test]
fn benchmark_card_classification() {
    let mut cards = Vec::new();
    for rank in 3..=6 {
        for suit in [Suit::Spades, Suit::Hearts, Suit::Clubs] {
            cards.push(Card::new(rank, suit));
        }
    }
    for rank in [9, 10, 11, 12] {
        cards.push(Card::new(rank, Suit::Diamonds));
    }

    let iterations = 100_000;
    let start = Instant::now();
    for _ in 0..iterations {
        assert!(classify(&cards).is_some());
    }
    let duration = start.elapsed();
    println!("Card classification: {} iterations in {:?}", iterations, duration);

    assert!(duration.as_secs() < 5);
}

/// Benchmarks encoding the largest routine event, a full go board
#[test]
fn benchmark_board_event_serialization() {
    let packet = Packet::Event(Event::GameStarted {
        room_id: 1234,
        turn: 0,
        view: Board::new(GameKind::Go).view(None),
    });

    let iterations = 10_000;
    let start = Instant::now();
    let mut size = 0;
    for _ in 0..iterations {
        let bytes = serialize(&packet).unwrap();
        size = bytes.len();
        let _: Packet = deserialize(&bytes).unwrap();
    }
    let duration = start.elapsed();
    println!(
        "Board event: {} bytes, {} round trips in {:?}",
        size, iterations, duration
    );

    assert!(size < MAX_PACKET_SIZE);
    assert!(duration.as_secs() < 5);
}
