//! Fairdice CLI
//!
//! Thin interactive shell around `fairdice-core`: argument parsing, terminal
//! prompts, and display formatting. All protocol and game decisions live in
//! the core.

use clap::Parser;
use fairdice_core::{
    Commitment, Decision, Die, Error, Match, MatchVerdict, Player, PlayerAgent, ProbabilityMatrix,
    Result, RoundKind, TiePolicy,
};
use rand::rngs::OsRng;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fairdice",
    about = "A provably fair dice game against the computer",
    long_about = "Each die is given as six comma-separated integer faces.\n\
                  Example: fairdice 2,2,4,4,9,9 6,8,1,1,8,6 7,5,3,7,5,3\n\
                  Every random outcome is decided by a commit-reveal protocol,\n\
                  so neither side can cheat without being caught."
)]
struct Args {
    /// Dice as comma-separated face lists (at least 3)
    #[arg(required = true, num_args = 1..)]
    dice: Vec<String>,

    /// Replay tied rolls instead of reporting a draw
    #[arg(long)]
    reroll_ties: bool,
}

/// Interactive human player reading answers from stdin.
///
/// `H` prints context help, `E` (or end of input) quits the game.
struct TerminalPlayer;

impl TerminalPlayer {
    /// Prompt until the user supplies a number in `[0, bound)`, asks for
    /// help, or quits.
    fn prompt_number(&self, prompt: &str, bound: u64, help: &str) -> Decision<u64> {
        loop {
            print!("{prompt} (0-{}, H for help, E to exit): ", bound - 1);
            let line = match read_line() {
                Some(line) => line,
                None => return Decision::Quit,
            };
            match line.to_lowercase().as_str() {
                "e" => return Decision::Quit,
                "h" => {
                    println!("{help}");
                    continue;
                }
                other => match other.parse::<u64>() {
                    Ok(n) if n < bound => return Decision::Pick(n),
                    _ => println!("Invalid choice. Enter a number between 0 and {}.", bound - 1),
                },
            }
        }
    }
}

impl PlayerAgent for TerminalPlayer {
    fn toss_contribution(&mut self, commitment: &Commitment) -> Result<Decision<u64>> {
        println!("\nDeciding who picks a die first.");
        println!("The computer has committed to a secret bit:");
        println!("  commitment (HMAC-SHA3-256): {commitment}");
        Ok(self.prompt_number(
            "Your bit",
            2,
            "The first pick goes to you if (secret + your bit) mod 2 is odd.\n\
             The commitment above fixes the secret before you choose, so the\n\
             computer cannot steer the toss.",
        ))
    }

    fn choose_die(
        &mut self,
        available: &[usize],
        dice: &[Die],
        matrix: &ProbabilityMatrix,
    ) -> Result<Decision<usize>> {
        println!("\nAvailable dice:");
        for &i in available {
            println!("  {}. {}", i + 1, dice[i]);
        }
        loop {
            print!("Select your die (number, H for help, E to exit): ");
            let line = match read_line() {
                Some(line) => line,
                None => return Ok(Decision::Quit),
            };
            match line.to_lowercase().as_str() {
                "e" => return Ok(Decision::Quit),
                "h" => {
                    println!(
                        "Each die has six faces; the higher revealed face wins.\n\
                         Win probabilities (row beats column):"
                    );
                    print_matrix(dice, matrix);
                }
                other => match other.parse::<usize>() {
                    Ok(n) if n >= 1 && available.contains(&(n - 1)) => {
                        return Ok(Decision::Pick(n - 1));
                    }
                    _ => println!("Invalid choice. Pick one of the listed dice."),
                },
            }
        }
    }

    fn roll_contribution(
        &mut self,
        round: RoundKind,
        commitment: &Commitment,
        modulus: u64,
    ) -> Result<Decision<u64>> {
        let whose = match round {
            RoundKind::HumanRoll => "your roll",
            RoundKind::ComputerRoll => "the computer's roll",
            RoundKind::FirstPickToss => "the toss",
        };
        println!("\nRolling for {whose}.");
        println!("The computer has committed to a secret index:");
        println!("  commitment (HMAC-SHA3-256): {commitment}");
        Ok(self.prompt_number(
            "Your number",
            modulus,
            "The face index is (secret + your number) mod the face count.\n\
             The commitment fixes the secret before you choose; after the\n\
             reveal you can verify it yourself from the transcript.",
        ))
    }
}

fn read_line() -> Option<String> {
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn print_matrix(dice: &[Die], matrix: &ProbabilityMatrix) {
    print!("{:>12}", "");
    for j in 0..dice.len() {
        print!("{:>10}", format!("die {}", j + 1));
    }
    println!();
    for i in 0..dice.len() {
        print!("{:>12}", format!("die {}", i + 1));
        for j in 0..dice.len() {
            match matrix.probability(i, j) {
                Some(p) => print!("{p:>10.3}"),
                None => print!("{:>10}", "-"),
            }
        }
        println!();
    }
}

fn print_transcript(outcome: &fairdice_core::MatchOutcome) {
    println!("\nProtocol transcript (game {}):", outcome.game_id);
    for record in &outcome.rounds {
        println!("  {} round:", record.commit.round);
        println!("    commitment:   {}", record.commit.commitment);
        println!("    your number:  {}", record.contribution.contribution);
        println!("    revealed:     {}", record.reveal.reveal.value);
        println!("    nonce:        {}", record.reveal.reveal.nonce.to_hex());
        println!(
            "    verified:     {}",
            if record.result.is_valid { "ok" } else { "FAILED" }
        );
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let configs: Vec<Vec<i64>> = args
        .dice
        .iter()
        .map(|spec| spec.parse::<Die>().map(|die| die.faces().to_vec()))
        .collect::<Result<_>>()?;

    let policy = if args.reroll_ties {
        TiePolicy::Reroll
    } else {
        TiePolicy::Draw
    };
    let game = Match::from_configs(&configs, policy)?;

    println!("Provably fair dice game. Dice in play:");
    for (i, die) in game.dice().iter().enumerate() {
        println!("  {}. {}", i + 1, die);
    }

    let mut player = TerminalPlayer;
    match game.play(&mut OsRng, &mut player)? {
        MatchVerdict::Aborted => {
            println!("\nGame exited.");
            Ok(ExitCode::SUCCESS)
        }
        MatchVerdict::Completed(outcome) => {
            print_transcript(&outcome);
            println!(
                "\nYou rolled {} (die {}), the computer rolled {} (die {}).",
                outcome.human_roll,
                outcome.human_die + 1,
                outcome.computer_roll,
                outcome.computer_die + 1
            );
            match outcome.winner {
                Some(Player::Human) => println!("You win!"),
                Some(Player::Computer) => println!("The computer wins!"),
                None => println!("It's a draw."),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(err @ Error::IntegrityViolation { .. }) => {
            error!(%err, "terminating: the counterpart attempted to cheat");
            eprintln!("Integrity violation: {err}");
            ExitCode::from(2)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
