use anyhow::Result;
use chess_quest::coordinator::{LogSource, TurnCoordinator, TurnState, play_opponent_turn};
use chess_quest::opponent::{Difficulty, init_opponent};
use chess_quest::util::{parse_coordinate_move, parse_square};
use env_logger::{Env, Target};
use log::info;
use shakmaty::Color;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let difficulty = Difficulty::from_env();
    let mut opponent = init_opponent();
    let mut coordinator = TurnCoordinator::new(difficulty);
    let mut printed_log = 0;

    info!("You play White against {:?} opposition.", difficulty);
    println!("Moves in coordinate form (e2e4, e7e8q). Commands: targets <sq>, missions, reset, quit.");
    print_position(&coordinator);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "exit" => break,
            "reset" => {
                coordinator.reset();
                print_position(&coordinator);
                continue;
            }
            "missions" => {
                print_missions(&coordinator);
                continue;
            }
            _ => {}
        }

        if let Some(square_str) = input.strip_prefix("targets ") {
            match parse_square(square_str) {
                Ok(square) => {
                    let targets = coordinator.request_legal_targets(square);
                    if targets.is_empty() {
                        println!("no moves from {square}");
                    } else {
                        let listed: Vec<String> =
                            targets.iter().map(|sq| sq.to_string()).collect();
                        println!("{square}: {}", listed.join(" "));
                    }
                }
                Err(e) => println!("{e}"),
            }
            continue;
        }

        let (from, to, promotion) = match parse_coordinate_move(input) {
            Ok(parsed) => parsed,
            Err(_) => {
                println!("could not read '{input}' as a move");
                continue;
            }
        };

        match coordinator.submit_human_move(from, to, promotion) {
            Ok(record) => println!("you played {}", record.san),
            Err(e) => {
                println!("{e}");
                continue;
            }
        }

        if coordinator.state() == TurnState::AwaitingOpponent {
            play_opponent_turn(&mut coordinator, opponent.as_mut()).await;
        }

        printed_log = flush_log(&coordinator, printed_log);
        print_position(&coordinator);

        if coordinator.state() == TurnState::Terminal {
            announce_result(&coordinator);
            println!("type 'reset' for a new game or 'quit' to leave");
        }
    }

    Ok(())
}

fn print_position(coordinator: &TurnCoordinator) {
    let snapshot = coordinator.snapshot();
    println!(
        "[ply {}] {} to move | {}",
        snapshot.move_history.len(),
        if snapshot.side_to_move == Color::White {
            "White"
        } else {
            "Black"
        },
        snapshot.fen
    );
}

fn print_missions(coordinator: &TurnCoordinator) {
    for mission in coordinator.missions() {
        println!(
            "[{}] {} - {} ({} xp)",
            if mission.completed { "x" } else { " " },
            mission.title,
            mission.description,
            mission.xp_reward
        );
    }
    let stats = coordinator.stats();
    println!(
        "level {} | {} xp | streak {} | {} tickets closed",
        stats.level, stats.xp, stats.streak, stats.tickets_closed
    );
}

fn flush_log(coordinator: &TurnCoordinator, from: usize) -> usize {
    let log = coordinator.log();
    for entry in &log[from..] {
        let tag = match entry.source {
            LogSource::Analysis => "analysis",
            LogSource::Narration => "narration",
        };
        println!("  [{tag}] {}", entry.text);
    }
    log.len()
}

fn announce_result(coordinator: &TurnCoordinator) {
    let snapshot = coordinator.snapshot();
    if snapshot.is_checkmate {
        let winner = match snapshot.side_to_move {
            Color::White => "Black",
            Color::Black => "White",
        };
        println!("checkmate - {winner} wins");
    } else {
        println!("game over - draw");
    }
}
