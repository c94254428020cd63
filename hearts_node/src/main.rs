//! One node of a four-player distributed Hearts game.
//!
//! Every node runs this same binary with a distinct `--player` index; there
//! is no server. Node 0 hosts the bootstrap and deals, after which all four
//! peers are equals driven by broadcast events and the circulating token.

mod console;

use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use anyhow::{Error, ensure};
use ctrlc::set_handler;
use hearts::coordination::Coordinator;
use hearts::game::entities::{NUM_PLAYERS, PlayerIndex};
use hearts::net::messages::decode;
use hearts::net::transport::{MAX_DATAGRAM, Ring, UdpTransport};
use hearts::strategy;
use log::{info, warn};
use pico_args::Arguments;

use console::Console;

const HELP: &str = "\
Run one node of a four-player distributed Hearts game

USAGE:
  hearts_node --player N [OPTIONS]

OPTIONS:
  --player     N           This node's index, 0..=3; node 0 hosts
  --ip         ADDR        Shared peer IP address        [default: 127.0.0.1]
  --base-port  PORT        Player i listens on PORT + i  [default: 5000]

FLAGS:
  --auto                   Play automatically instead of prompting
  -h, --help               Print help information
";

struct Args {
    player: PlayerIndex,
    ip: IpAddr,
    base_port: u16,
    auto: bool,
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        player: pargs.value_from_str("--player")?,
        ip: pargs
            .value_from_str("--ip")
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST)),
        base_port: pargs.value_from_str("--base-port").unwrap_or(5000),
        auto: pargs.contains("--auto"),
    };
    ensure!(
        args.player < NUM_PLAYERS,
        "--player must be 0..={}",
        NUM_PLAYERS - 1
    );

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let ring = Ring::new(args.ip, args.base_port, args.player);
    let mut transport = UdpTransport::bind(ring)?;
    info!(
        "player {} listening on {}",
        args.player,
        transport.ring().my_addr()
    );

    let coordinator = Arc::new(Mutex::new(Coordinator::new(args.player)));
    lock(&coordinator).start(&mut transport);

    spawn_receiver(Arc::clone(&coordinator), transport.clone(), args.player);
    run_local_loop(&coordinator, &mut transport, args.player, args.auto)
}

// A panic while holding the lock cannot corrupt the coordinator in a way
// the protocol cares about, so a poisoned guard is still usable.
fn lock(coordinator: &Arc<Mutex<Coordinator>>) -> MutexGuard<'_, Coordinator> {
    coordinator.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The receive path: datagram in, decode, hand to the coordinator. Runs
/// until the game ends.
fn spawn_receiver(
    coordinator: Arc<Mutex<Coordinator>>,
    mut transport: UdpTransport,
    player: PlayerIndex,
) {
    thread::spawn(move || {
        let mut view = Console::new(player);
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match transport.recv_datagram(&mut buf) {
                Ok(Some((len, from))) => match decode(&buf[..len]) {
                    Ok(inbound) => {
                        lock(&coordinator).handle(inbound, &mut transport, &mut view);
                    }
                    Err(err) => warn!("dropping undecodable datagram from {from}: {err}"),
                },
                // Timeout: a chance to notice the game is over.
                Ok(None) => {
                    if lock(&coordinator).game_over() {
                        break;
                    }
                }
                Err(err) => warn!("receive failed: {err}"),
            }
        }
    });
}

/// The local-action path: whenever this node holds the token, pick a card
/// (interactively or via the strategy) and play it. The lock is never held
/// across the interactive prompt.
fn run_local_loop(
    coordinator: &Arc<Mutex<Coordinator>>,
    transport: &mut UdpTransport,
    player: PlayerIndex,
    auto: bool,
) -> Result<(), Error> {
    let mut view = Console::new(player);
    loop {
        thread::sleep(Duration::from_millis(50));
        {
            let node = lock(coordinator);
            if node.game_over() {
                info!("player {player} exiting");
                return Ok(());
            }
            if !node.my_turn() {
                continue;
            }
        }

        if auto {
            let mut node = lock(coordinator);
            if !node.my_turn() {
                continue;
            }
            let state = node.state();
            let Some(card) = strategy::choose_card(
                state.hand(),
                state.trick(),
                state.hearts_broken(),
                state.first_trick(),
            ) else {
                continue;
            };
            if let Err(err) = node.play_card(card, transport, &mut view) {
                warn!("automatic play rejected: {err}");
            }
        } else {
            let legal = {
                let node = lock(coordinator);
                if !node.my_turn() {
                    continue;
                }
                node.legal_plays()
            };
            let Some(card) = view.prompt_card(&legal) else {
                info!("input closed; exiting");
                return Ok(());
            };
            if let Err(err) = lock(coordinator).play_card(card, transport, &mut view) {
                println!("{err}");
            }
        }
    }
}
