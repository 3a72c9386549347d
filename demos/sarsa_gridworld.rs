use std::{error::Error, fs, path::Path};

use gridrl::algo::SarsaAgent;
use gridrl::env::{Environment, GridWorld};
use gridrl::exploration::EpsilonGreedy;
use gridrl::grid::Grid;

const N: usize = 7;
const NUM_EPISODES: u32 = 2000;

fn main() -> Result<(), Box<dyn Error>> {
    let path = Path::new("demos");

    let mut grid = Grid::new(N, (2, 2))?;
    for hole in [(1, 1), (1, 2), (5, 3), (4, 6), (0, 3)] {
        grid.create_hole(hole)?;
    }
    let mut env = GridWorld::new(grid, (6, 6))?;
    let mut agent = SarsaAgent::new(N, 0.3, 0.9, EpsilonGreedy::new(0.5, 0.05, 0.005));

    fs::create_dir_all(path.join("out"))?;

    let mut wtr = csv::Writer::from_path(path.join("out/returns.csv"))?;
    wtr.write_record(["episode", "return"])?;

    for i in 0..NUM_EPISODES {
        agent.go(&mut env);
        wtr.write_record(&[i.to_string(), env.cumulative_return().to_string()])?;
    }

    wtr.flush()?;

    let policy = agent.policy();
    println!("Greedy policy after {NUM_EPISODES} episodes:");
    for row in 0..N {
        for col in 0..N {
            print!("{} ", policy[(row, col)]);
        }
        println!();
    }

    let mut state = env.reset();
    print!("\nRollout: ({}, {})", state.0, state.1);
    for _ in 0..N * N {
        let (next, _, done) = env.step(policy[state]);
        state = next;
        print!(" -> ({}, {})", state.0, state.1);
        if done {
            break;
        }
    }
    println!("\nReturn: {}", env.cumulative_return());

    Ok(())
}
