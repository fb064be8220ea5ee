#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("no background images to compose onto")]
    NoBackground,
    #[error("no card images to choose from")]
    NoCards,
    #[error(
        "card `{card}` rotated to {rotated_w}x{rotated_h} does not fit background {bg_w}x{bg_h}"
    )]
    Placement {
        card: String,
        rotated_w: u32,
        rotated_h: u32,
        bg_w: u32,
        bg_h: u32,
    },
}
