// Slice-shaped sequences of syntax elements, coded with SbacEncoder and parsed
// back with SbacReader in the same order.

#[cfg(test)]
mod syntax_roundtrip {
    use sbac_rs::sbac::coding_unit::PredictionUnitInfo;
    use sbac_rs::sbac::{CodingUnitInfo, ResidualBlock, SaoBlkParam, SaoMerge, SaoOffset, SaoType};
    use sbac_rs::{
        BinEncoder, BtSplit, CabacEncoder, CodingParameters, ComponentId, InterDir, Mv, PredMode, RefPicList,
        SbacEncoder, SbacReader, SliceType,
    };

    fn finished(mut sbac: SbacEncoder) -> Vec<u8> {
        sbac.code_slice_finish();
        sbac.bin_if_mut().write_trailing_bits();
        sbac.into_bin_if().into_sink().into_data()
    }

    fn started(params: CodingParameters) -> SbacEncoder {
        let mut sbac = SbacEncoder::new(CabacEncoder::default(), params).unwrap();
        sbac.reset_entropy(&params).unwrap();
        sbac
    }

    /// Levels at scan positions 0..=2 of the first group and a lone level further out.
    fn residual(log2_size: u32, seed: i32) -> Vec<i32> {
        let width = 1usize << log2_size;
        let mut coefficients = vec![0; width * width];
        coefficients[0] = 3 + seed;
        coefficients[1] = -1;
        coefficients[width] = if seed % 2 == 0 { 2 } else { -1 };
        if log2_size > 2 {
            coefficients[(width - 2) * width + width - 3] = -(1 + seed % 4);
        }
        coefficients
    }

    struct IntraCu {
        cu: CodingUnitInfo,
        luma: Vec<i32>,
        chroma: Vec<i32>,
    }

    impl IntraCu {
        fn new(index: usize, left: Option<&IntraCu>) -> Self {
            let mode = [26, 1, 2, 10, 18, 34, 0, 7][index % 8];
            let cu = CodingUnitInfo {
                depth: 1,
                log2_width: 5,
                log2_height: 5,
                left: left.map(|left| left.cu.neighbour_info()),
                pred_mode: PredMode::Intra,
                parts: vec![PredictionUnitInfo {
                    intra_dir_luma: mode,
                    intra_mpm_candidates: vec![0, 1, 26],
                    ..PredictionUnitInfo::default()
                }],
                intra_chroma_candidate: if index % 3 == 0 { None } else { Some(index as u32 % 4) },
                qp: 31 + (index % 3) as i32,
                ref_qp: 32,
                ..CodingUnitInfo::default()
            };
            Self {
                cu,
                luma: residual(5, index as i32),
                chroma: residual(4, index as i32 + 1),
            }
        }

        fn luma_block(&self) -> ResidualBlock<'_> {
            let mut block = ResidualBlock::new(ComponentId::Y, 5, 5, &self.luma);
            block.pred_mode = PredMode::Intra;
            block.intra_dir = Some(self.cu.parts[0].intra_dir_luma);
            block
        }

        fn chroma_block(&self) -> ResidualBlock<'_> {
            let mut block = ResidualBlock::new(ComponentId::Cb, 4, 4, &self.chroma);
            block.pred_mode = PredMode::Intra;
            block.intra_dir = Some(1);
            block
        }

        fn code(&self, sbac: &mut SbacEncoder) {
            sbac.code_split_flag(&self.cu, 1);
            sbac.code_part_size(&self.cu, 1);
            sbac.code_intra_dir_luma_ang(&self.cu, true);
            sbac.code_intra_dir_chroma(&self.cu);
            sbac.code_transform_subdiv_flag(false, 5);
            sbac.code_qt_cbf(ComponentId::Cb, 0, true);
            sbac.code_qt_cbf(ComponentId::Cr, 0, false);
            sbac.code_qt_cbf(ComponentId::Y, 0, true);
            sbac.code_delta_qp(&self.cu);
            sbac.code_coeff_nxn(&self.luma_block());
            sbac.code_coeff_nxn(&self.chroma_block());
        }

        fn assert_parses(&self, reader: &mut SbacReader) {
            assert!(!reader.parse_split_flag(&self.cu, 1));
            assert_eq!(reader.parse_part_size(&self.cu, 1), self.cu.part_size);
            assert_eq!(reader.parse_intra_dir_luma_ang(&self.cu, true), vec![self.cu.parts[0].intra_dir_luma]);
            assert_eq!(reader.parse_intra_dir_chroma(&self.cu), self.cu.chroma_intra_mode());
            assert!(!reader.parse_transform_subdiv_flag(5));
            assert!(reader.parse_qt_cbf(ComponentId::Cb, 0));
            assert!(!reader.parse_qt_cbf(ComponentId::Cr, 0));
            assert!(reader.parse_qt_cbf(ComponentId::Y, 0));
            assert_eq!(reader.parse_delta_qp(), self.cu.qp - self.cu.ref_qp);
            assert_eq!(reader.parse_coeff_nxn(&self.luma_block()).coefficients, self.luma);
            assert_eq!(reader.parse_coeff_nxn(&self.chroma_block()).coefficients, self.chroma);
        }
    }

    fn intra_ctu(first_index: usize) -> Vec<IntraCu> {
        let mut cus: Vec<IntraCu> = Vec::new();
        for index in first_index..first_index + 4 {
            let cu = IntraCu::new(index, cus.last());
            cus.push(cu);
        }
        cus
    }

    fn sao_for_ctu(index: usize) -> SaoBlkParam {
        if index == 0 {
            let mut param = SaoBlkParam::default();
            param.components[0] = SaoOffset {
                sao_type: SaoType::Edge { class: 1 },
                offsets: [2, 1, -1, -3],
            };
            param.components[1] = SaoOffset {
                sao_type: SaoType::Band { position: 12 },
                offsets: [1, -2, 0, 4],
            };
            param.components[2] = SaoOffset {
                sao_type: SaoType::Band { position: 20 },
                offsets: [0, 0, -1, 1],
            };
            param
        } else {
            SaoBlkParam {
                merge: SaoMerge::Left,
                ..SaoBlkParam::default()
            }
        }
    }

    #[test]
    fn test_intra_slice() {
        let mut params = CodingParameters::hevc();
        params.slice.slice_type = SliceType::I;
        params.slice.qp = 32;
        params.picture.cu_qp_delta = true;

        let ctus: Vec<Vec<IntraCu>> = (0..4).map(|ctu| intra_ctu(ctu * 4)).collect();

        let mut sbac = started(params);
        for (index, cus) in ctus.iter().enumerate() {
            sbac.code_sao_blk_param(&sao_for_ctu(index), index > 0, false, false);
            sbac.code_split_flag(&cus[0].cu, 0);
            for cu in cus {
                cu.code(&mut sbac);
            }
            sbac.code_terminating_bit(index == ctus.len() - 1);
        }
        let data = finished(sbac);

        let mut reader = SbacReader::new(&data, params).unwrap();
        for (index, cus) in ctus.iter().enumerate() {
            assert_eq!(reader.parse_sao_blk_param(index > 0, false), sao_for_ctu(index), "ctu {index}");
            assert!(reader.parse_split_flag(&cus[0].cu, 0));
            for cu in cus {
                cu.assert_parses(&mut reader);
            }
            assert_eq!(reader.parse_terminating_bit(), index == ctus.len() - 1);
        }
    }

    #[test]
    fn test_wavefront_rows_restart_contexts() {
        let mut params = CodingParameters::hevc();
        params.slice.slice_type = SliceType::I;
        params.slice.qp = 27;

        let rows = [intra_ctu(0), intra_ctu(7)];
        let mut sbac = started(params);
        for (row, cus) in rows.iter().enumerate() {
            sbac.code_split_flag(&cus[0].cu, 0);
            for cu in cus {
                cu.code(&mut sbac);
            }
            if row == 0 {
                sbac.code_terminating_bit(false);
                sbac.update_context_tables(SliceType::I, 27, true);
            } else {
                sbac.code_terminating_bit(true);
            }
        }
        let data = finished(sbac);

        let mut reader = SbacReader::new(&data, params).unwrap();
        for (row, cus) in rows.iter().enumerate() {
            assert!(reader.parse_split_flag(&cus[0].cu, 0));
            for cu in cus {
                cu.assert_parses(&mut reader);
            }
            if row == 0 {
                assert!(!reader.parse_terminating_bit());
                reader.parse_substream_end(SliceType::I, 27).unwrap();
            } else {
                assert!(reader.parse_terminating_bit());
            }
        }
    }

    fn inter_cu(index: usize, left: Option<&CodingUnitInfo>) -> CodingUnitInfo {
        let skip = index % 5 == 0;
        let merge = skip || index % 4 == 1;
        let imv = if merge { 0 } else { (index % 3) as u32 };
        let unit = [1, 4, 16][imv as usize];
        let inter_dir = [InterDir::L0, InterDir::L1, InterDir::Bi][index % 3];
        CodingUnitInfo {
            depth: 2,
            log2_width: 5,
            log2_height: 5,
            left: left.map(CodingUnitInfo::neighbour_info),
            skip,
            pred_mode: PredMode::Inter,
            bt_splits: vec![BtSplit::None; 8],
            parts: vec![PredictionUnitInfo {
                merge_flag: merge,
                merge_index: (index % 5) as u32,
                inter_dir,
                ref_idx: [(index % 3) as u32, (index % 2) as u32],
                mvd: [
                    Mv::new(unit * (index as i32 - 3), -unit * 2),
                    Mv::new(0, unit * (index as i32 % 4)),
                ],
                mvp_idx: [(index % 2) as u32, ((index + 1) % 2) as u32],
                ..PredictionUnitInfo::default()
            }],
            root_cbf: !skip && index % 2 == 0,
            obmc: index % 2 == 1,
            ic: index % 3 == 2,
            imv,
            affine: !merge && index % 4 == 2,
            ..CodingUnitInfo::default()
        }
    }

    fn code_inter_cu(sbac: &mut SbacEncoder, cu: &CodingUnitInfo, luma: &[i32]) {
        for depth in 0..=2 {
            sbac.code_split_flag(cu, depth);
        }
        sbac.code_bt_split_mode(cu, 5, 5);
        sbac.code_skip_flag(cu);
        if cu.skip {
            sbac.code_merge_index(cu, 0);
            return;
        }
        sbac.code_pred_mode(cu);
        sbac.code_merge_flag(cu, 0);
        if cu.parts[0].merge_flag {
            sbac.code_merge_index(cu, 0);
        } else {
            sbac.code_affine_flag(cu);
            sbac.code_inter_dir(cu, 0);
            for list in [RefPicList::L0, RefPicList::L1] {
                if cu.parts[0].inter_dir.uses(list) {
                    sbac.code_ref_frm_idx(cu, 0, list);
                    sbac.code_mvd(cu, 0, list);
                    sbac.code_mvp_idx(cu, 0, list);
                }
            }
            sbac.code_imv_flag(cu);
        }
        sbac.code_obmc_flag(cu);
        sbac.code_ic_flag(cu);
        sbac.code_qt_root_cbf(cu);
        if cu.root_cbf {
            sbac.code_qt_cbf(ComponentId::Y, 0, true);
            sbac.code_coeff_nxn(&ResidualBlock::new(ComponentId::Y, 5, 5, luma));
        }
    }

    fn assert_inter_cu(reader: &mut SbacReader, cu: &CodingUnitInfo, luma: &[i32]) {
        assert!(reader.parse_split_flag(cu, 0));
        assert!(reader.parse_split_flag(cu, 1));
        assert!(!reader.parse_split_flag(cu, 2));
        assert_eq!(reader.parse_bt_split_mode(cu, 5, 5), BtSplit::None);
        assert_eq!(reader.parse_skip_flag(cu), cu.skip);
        let pu = &cu.parts[0];
        if cu.skip {
            assert_eq!(reader.parse_merge_index(), pu.merge_index);
            return;
        }
        assert_eq!(reader.parse_pred_mode(), PredMode::Inter);
        assert_eq!(reader.parse_merge_flag(), pu.merge_flag);
        if pu.merge_flag {
            assert_eq!(reader.parse_merge_index(), pu.merge_index);
        } else {
            assert_eq!(reader.parse_affine_flag(cu), cu.affine);
            assert_eq!(reader.parse_inter_dir(cu), pu.inter_dir);
            for list in [RefPicList::L0, RefPicList::L1] {
                if pu.inter_dir.uses(list) {
                    assert_eq!(reader.parse_ref_frm_idx(list), pu.ref_idx[list as usize]);
                    assert_eq!(reader.parse_mvd(cu, 0, list), pu.mvd[list as usize]);
                    assert_eq!(reader.parse_mvp_idx(), pu.mvp_idx[list as usize]);
                }
            }
            assert_eq!(reader.parse_imv_flag(cu), cu.imv);
        }
        assert_eq!(reader.parse_obmc_flag(), cu.obmc);
        assert_eq!(reader.parse_ic_flag(), cu.ic);
        assert_eq!(reader.parse_qt_root_cbf(), cu.root_cbf);
        if cu.root_cbf {
            assert!(reader.parse_qt_cbf(ComponentId::Y, 0));
            let parsed = reader.parse_coeff_nxn(&ResidualBlock::new(ComponentId::Y, 5, 5, luma));
            assert_eq!(parsed.coefficients, luma);
        }
    }

    #[test]
    fn test_jem_inter_slice() {
        let mut params = CodingParameters::jem();
        params.slice.slice_type = SliceType::B;
        params.slice.qp = 35;
        params.slice.num_ref_idx = [3, 2];

        let mut cus: Vec<CodingUnitInfo> = Vec::new();
        for index in 0..12 {
            let cu = inter_cu(index, cus.last());
            cus.push(cu);
        }
        let residuals: Vec<Vec<i32>> = (0..cus.len()).map(|index| residual(5, index as i32)).collect();

        let mut sbac = started(params);
        for (cu, luma) in cus.iter().zip(&residuals) {
            code_inter_cu(&mut sbac, cu, luma);
        }
        sbac.code_terminating_bit(true);
        let data = finished(sbac);

        let mut reader = SbacReader::new(&data, params).unwrap();
        for (cu, luma) in cus.iter().zip(&residuals) {
            assert_inter_cu(&mut reader, cu, luma);
        }
        assert!(reader.parse_terminating_bit());
    }

    #[test]
    fn test_trial_coding_keeps_only_the_chosen_candidate() {
        let mut params = CodingParameters::jem();
        params.slice.slice_type = SliceType::P;
        params.slice.num_ref_idx = [3, 2];

        let first = inter_cu(3, None);
        let candidates = [inter_cu(6, Some(&first)), inter_cu(7, Some(&first))];
        let luma = residual(5, 2);

        let mut sbac = started(params);
        code_inter_cu(&mut sbac, &first, &luma);

        let mut start = sbac.clone();
        sbac.store(&mut start);
        let mut trials = Vec::new();
        for candidate in &candidates {
            let mut trial = start.clone();
            trial.load(&start);
            code_inter_cu(&mut trial, candidate, &luma);
            trials.push(trial);
        }
        // the second candidate wins
        sbac.load(&trials[1]);
        sbac.code_terminating_bit(true);
        let data = finished(sbac);

        let mut reader = SbacReader::new(&data, params).unwrap();
        assert_inter_cu(&mut reader, &first, &luma);
        assert_inter_cu(&mut reader, &candidates[1], &luma);
        assert!(reader.parse_terminating_bit());
    }
}
