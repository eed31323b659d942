fn main() -> anyhow::Result<()> {
    maps_filter::cli::run_part2()
}
