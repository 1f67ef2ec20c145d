use clap::Parser;
use endless_runner_lib::{args::Args, game, host};

pub fn main() {
    let args = Args::parse();
    let on_state_change = host::page_state_callback(args.canvas.clone());
    game::run_game(args, Some(on_state_change));
}
