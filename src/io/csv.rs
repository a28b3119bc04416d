/// Writes `nodeId,communityId` rows, header first, in the given node order.
pub fn write<T: std::fmt::Display>(node_order: &[T], membership: &[usize]) -> String {
    let mut out = String::from("nodeId,communityId\n");
    for (id, c) in node_order.iter().zip(membership.iter()) {
        out.push_str(&format!("{id},{c}\n"));
    }
    out
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_write_header_and_rows() {
        let out = write(&["a", "b"], &[0, 1]);
        assert_eq!(out, "nodeId,communityId\na,0\nb,1\n");
    }
}
