use ragged::{
    ArrayError, ChunkLimit, Dim, ErrorKind, RaggedArray, SplitEncoding,
    array::{row_splits, shape},
    plan_chunks,
};

/// A few ragged layouts with and without trailing axes, including empty rows.
fn ragged_cases() -> Vec<RaggedArray<'static, i32>> {
    let layouts: [(&[i64], &[usize]); 4] = [
        (&[2, 0, 3], &[]),
        (&[0, 0, 1, 4], &[2]),
        (&[5], &[3, 2]),
        (&[1, 1, 1, 1, 1, 1], &[]),
    ];
    layouts
        .iter()
        .map(|(lengths, trailing)| {
            let rs = row_splits::from_row_lengths(lengths);
            let stride: usize = trailing.iter().product();
            let size = *rs.last().unwrap() as usize * stride;
            RaggedArray::ragged((0..size as i32).collect(), rs, trailing).unwrap()
        })
        .collect()
}

/// Ragged arrays whose ragged axis holds no entries at all.
fn entry_free_cases() -> Vec<RaggedArray<'static, i32>> {
    vec![
        RaggedArray::ragged(vec![], vec![0], &[]).unwrap(),
        RaggedArray::ragged(vec![], vec![0, 0, 0], &[]).unwrap(),
        RaggedArray::ragged(vec![], vec![0, 0], &[3]).unwrap(),
    ]
}

#[test]
fn construct_then_read_back_layout() {
    let shape = shape::ragged(3, &[4]);
    let rs = vec![0i64, 2, 2, 5];
    let arr = RaggedArray::<u32>::try_with_shape(&shape, rs.clone()).unwrap();
    assert_eq!(arr.shape(), shape.as_slice());
    assert_eq!(arr.row_splits(), rs.as_slice());
    assert_eq!(arr.size(), 20);
}

#[test]
fn serialization_roundtrip_preserves_everything() {
    for arr in ragged_cases().into_iter().chain(entry_free_cases()) {
        let back = RaggedArray::<i32>::from_bytes(arr.to_bytes().unwrap()).unwrap();
        assert_eq!(back, arr);
        assert_eq!(back.signed_shape().unwrap(), arr.signed_shape().unwrap());
    }
}

#[test]
fn split_then_append_restores_original() {
    for original in ragged_cases() {
        for at in 0..=original.first_dimension() {
            let mut tail = original.clone();
            let mut head = tail.split(at).unwrap();
            assert_eq!(head.size() + tail.size(), original.size());
            head.append(&tail).unwrap();
            assert_eq!(head, original, "split at {at}");
        }
    }
}

#[test]
fn full_slice_equals_original() {
    for arr in ragged_cases() {
        let rows = arr.first_dimension();
        let slice = arr.get_slice(0, rows).unwrap();
        assert_eq!(slice, arr);
    }
}

#[test]
fn split_keeps_empty_row_in_prefix() {
    let rs = row_splits::from_row_lengths(&[2, 0, 3]);
    assert_eq!(rs, vec![0, 2, 2, 5]);
    let mut arr = RaggedArray::ragged(vec![1i16, 2, 3, 4, 5], rs, &[]).unwrap();
    assert_eq!(arr.size_at(1).unwrap(), 0);

    let head = arr.split(2).unwrap();
    assert_eq!(head.row_splits(), &[0, 2, 2]);
    assert_eq!(head.size(), 2);
    assert_eq!(arr.row_splits(), &[0, 3]);
    assert_eq!(arr.size(), 3);
}

#[test]
fn shuffle_duplicates_and_reorders_rows() {
    let arr = RaggedArray::regular((0..12).collect::<Vec<u8>>(), &[4, 3]).unwrap();
    let out = arr.shuffle(&[3, 1, 1, 0]).unwrap();
    assert_eq!(out.shape(), &[Dim::Fixed(4), Dim::Fixed(3)]);
    assert_eq!(out.get_slice(2, 3).unwrap(), arr.get_slice(1, 2).unwrap());
    assert_eq!(out.get_slice(3, 4).unwrap(), arr.get_slice(0, 1).unwrap());

    let err = match arr.shuffle(&[4]) {
        Ok(_) => panic!("expected error"),
        Err(e) => e,
    };
    assert_eq!(err.kind(), ErrorKind::Index);
}

#[test]
fn chunk_boundaries_reconstruct_row_splits() {
    let rs = row_splits::from_row_lengths(&[3, 0, 2, 7, 1, 0, 0, 4, 4, 2]);
    let largest = *row_splits::to_row_lengths(&rs).iter().max().unwrap() as usize;
    for max_elements in largest..largest + 12 {
        let plan = plan_chunks(&rs, &ChunkLimit::new(max_elements)).unwrap();
        assert!(plan.all_within_limit(), "limit {max_elements}");
        assert!(plan.chunks.iter().all(|c| c.elements > 0));

        let mut rebuilt: Vec<i64> = Vec::new();
        let mut start = 0;
        for end in plan.indices(SplitEncoding::Boundaries) {
            let base = rs[start];
            let part: Vec<i64> = rs[start..=end].iter().map(|v| v - base).collect();
            rebuilt = row_splits::merge(&rebuilt, &part);
            start = end;
        }
        assert_eq!(rebuilt, rs, "limit {max_elements}");

        let counts = plan.indices(SplitEncoding::RowCounts);
        assert_eq!(counts.iter().sum::<usize>(), rs.len() - 1);
    }
}

#[test]
fn strict_plan_flags_oversized_row() {
    let plan = plan_chunks(&[0, 5, 9, 20, 22], &ChunkLimit::new(10)).unwrap();
    let summary: Vec<(usize, usize, bool)> = plan
        .chunks
        .iter()
        .map(|c| (c.rows(), c.elements, c.within_limit))
        .collect();
    assert_eq!(summary, vec![(2, 9, true), (1, 11, false), (1, 2, true)]);
}

#[test]
fn split_then_merge_row_splits() {
    let rs = row_splits::from_row_lengths(&[4, 0, 0, 2, 9]);
    for k in 0..rs.len() {
        let mut rest = rs.clone();
        let prefix = row_splits::split_at(&mut rest, k).unwrap();
        assert_eq!(row_splits::merge(&prefix, &rest), rs);
    }
}

#[test]
fn errors_carry_their_kind() {
    let mut arr = RaggedArray::regular(vec![0f32; 6], &[3, 2]).unwrap();
    assert_eq!(arr.split(4).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(arr.get_slice(2, 1).unwrap_err().kind(), ErrorKind::Range);
    assert_eq!(arr.at(&[3, 0]).unwrap_err().kind(), ErrorKind::Index);
    let other = RaggedArray::regular(vec![0f32; 3], &[1, 3]).unwrap();
    assert_eq!(arr.append(&other).unwrap_err().kind(), ErrorKind::Shape);
    assert!(matches!(
        plan_chunks(&[0, 0], &ChunkLimit::new(1)),
        Err(ArrayError::EmptyChunk { .. })
    ));
}

#[test]
fn files_hold_many_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batches.djc");
    let mut cases = ragged_cases();
    cases.extend(entry_free_cases());
    cases[0].write_to_file(&path).unwrap();
    for arr in &cases[1..] {
        arr.append_to_file(&path).unwrap();
    }

    let back = RaggedArray::<i32>::read_all_from_file(&path).unwrap();
    assert_eq!(back, cases);

    let mut file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
    for arr in &cases {
        let rs = ragged::array::format::read_row_splits(&mut file, true).unwrap();
        assert_eq!(rs, arr.row_splits());
    }
}
