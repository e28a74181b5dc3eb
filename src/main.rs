fn main() -> anyhow::Result<()> {
    sunflow::flow::run()
}
