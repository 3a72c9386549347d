use std::error::Error;

use gridrl::algo::DpSolver;
use gridrl::env::{Environment, GridWorld};
use gridrl::grid::Grid;
use gridrl::table::{PolicyTable, ValueFn};

const N: usize = 7;

fn main() -> Result<(), Box<dyn Error>> {
    let mut grid = Grid::new(N, (2, 2))?;
    for hole in [(1, 1), (1, 2), (5, 3), (4, 6), (0, 3)] {
        grid.create_hole(hole)?;
    }

    let solver = DpSolver::new(0.9, 0.01);
    let mut values = ValueFn::zeros(N);
    let mut policy = PolicyTable::random(N);
    solver.policy_iteration(&grid, &mut values, &mut policy);

    println!("State values:");
    for row in 0..N {
        for col in 0..N {
            print!("{:6.2} ", values[(row, col)]);
        }
        println!();
    }

    println!("\nGreedy policy:");
    for row in 0..N {
        for col in 0..N {
            print!("{} ", policy[(row, col)]);
        }
        println!();
    }

    let mut env = GridWorld::new(grid, (6, 6))?;
    let mut state = env.reset();
    print!("\nRollout: ({}, {})", state.0, state.1);
    while env.is_active() {
        let (next, _, _) = env.step(policy[state]);
        state = next;
        print!(" -> ({}, {})", state.0, state.1);
    }
    println!("\nReturn: {}", env.cumulative_return());

    Ok(())
}
