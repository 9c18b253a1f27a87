/// Events emitted by one simulation step. The UI shell turns these
/// into sounds and overlay messages; the simulation itself never
/// renders or plays anything.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GemCollected,
    PowerUpStarted,
    Poisoned,
    EnemyKilled,
    PlayerKilled,
    BonusLife,
    ExitReached,
}
