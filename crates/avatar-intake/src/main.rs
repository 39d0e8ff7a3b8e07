fn main() -> anyhow::Result<()> {
    avatar_intake::cli::main()
}
