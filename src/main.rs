use outbreak::runner::run_with_args;
use outbreak::ContextClockExt;

fn main() {
    let context = match run_with_args(|_, _| Ok(())) {
        Ok(context) => context,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let snapshot = context.snapshot();
    println!(
        "day {}: {} infected in total, {} currently infected, {} recovered, {} dead",
        snapshot.day,
        snapshot.counters.total_num_infected,
        snapshot.counters.num_currently_infected,
        snapshot.counters.num_recovered,
        snapshot.counters.num_deaths
    );
}
