use super::*;

#[test]
fn room_target_scopes_destinations_by_id() {
    let target = RoomTarget::Room("r-42");
    assert_eq!(target.topic(), "/topic/room.r-42");
    assert_eq!(target.join_destination(), "/app/chat.addUser/r-42");
    assert_eq!(target.send_destination(), "/app/chat.sendMessage/r-42");
}

#[test]
fn public_target_uses_unscoped_destinations() {
    let target = RoomTarget::Public;
    assert_eq!(target.topic(), "/topic/public");
    assert_eq!(target.join_destination(), "/app/chat.addUser");
    assert_eq!(target.send_destination(), "/app/chat.sendMessage");
}
