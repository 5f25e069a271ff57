mod confusion_network;
mod dialogue_act_item;

pub use self::confusion_network::DialogueActConfusionNetwork;
pub use self::dialogue_act_item::{DialogueAct, DialogueActItem};
