use carrot_orbit::SceneConfig;

fn main() -> anyhow::Result<()> {
    carrot_orbit::flow::run(SceneConfig::default())
}
